//! Property tests: detection bounds, merge idempotence, name inference,
//! canonical map round-trip, and reference precedence.

use std::path::Path;

use proptest::prelude::*;
use revspec_analysis::canonical::{entity_map, EntityView};
use revspec_analysis::extractors::naming::{entity_name, infer_common_entity_name};
use revspec_analysis::{
    adapter_for, extractor_for, merge, parse_type_expression, CanonicalEntity, ExtractionContext,
    MergedFieldMap, PatternOrchestrator, SourceLanguage,
};

const COLUMN_POOL: &[(&str, &str)] = &[
    ("id", "INTEGER"),
    ("pk_item", "UUID"),
    ("identifier", "TEXT"),
    ("name", "TEXT"),
    ("contact_email", "VARCHAR(255)"),
    ("price", "NUMERIC(10,2)"),
    ("created_at", "TIMESTAMPTZ"),
    ("created_by", "INTEGER"),
    ("updated_at", "TIMESTAMPTZ"),
    ("updated_by", "INTEGER"),
    ("deleted_at", "TIMESTAMPTZ"),
    ("deleted_by", "INTEGER"),
    ("owner_id", "INTEGER"),
    ("settings", "JSONB"),
];

fn sql_entities(sql: &str) -> Vec<CanonicalEntity> {
    let tree = adapter_for(SourceLanguage::Sql)
        .parse(sql, Path::new("schema.sql"))
        .unwrap();
    let mut ctx = ExtractionContext::new("schema.sql", SourceLanguage::Sql);
    extractor_for(SourceLanguage::Sql).extract_entities(&tree, &mut ctx)
}

fn create_table(table: &str, columns: &[(&str, &str)], pk: Option<&str>) -> String {
    let mut body: Vec<String> = columns.iter().map(|(name, ty)| format!("{name} {ty}")).collect();
    if let Some(pk) = pk {
        body.push(format!("PRIMARY KEY ({pk})"));
    }
    format!("CREATE TABLE {table} ({});", body.join(", "))
}

fn arb_columns() -> impl Strategy<Value = Vec<(&'static str, &'static str)>> {
    prop::sample::subsequence(COLUMN_POOL.to_vec(), 1..COLUMN_POOL.len())
}

fn arb_translatable() -> impl Strategy<Value = Vec<&'static str>> {
    prop::sample::subsequence(vec!["name", "color_name", "description", "slogan"], 0..4)
}

proptest! {
    #[test]
    fn test_detection_confidence_bounds(columns in arb_columns(), with_pk in any::<bool>()) {
        let pk = (with_pk && columns.iter().any(|(n, _)| *n == "id")).then_some("id");
        let entities = sql_entities(&create_table("tb_item", &columns, pk));
        let result = PatternOrchestrator::new().detect(&entities[0]);

        prop_assert!((0.0..=1.0).contains(&result.confidence));
        prop_assert_eq!(result.confidence == 0.0, result.patterns.is_empty());
        prop_assert_eq!(
            result.patterns.len(),
            result.verdicts.iter().filter(|v| v.matched).count()
        );
    }

    #[test]
    fn test_merge_is_idempotent(translatable in arb_translatable()) {
        let mut parent_columns = vec![("pk_product", "UUID")];
        parent_columns.extend(translatable.iter().map(|n| (*n, "TEXT")));
        let mut translation_columns = vec![("fk_product", "UUID NOT NULL"), ("locale", "TEXT NOT NULL")];
        translation_columns.extend(translatable.iter().map(|n| (*n, "TEXT")));

        let sql = format!(
            "{}\n{}",
            create_table("tb_product", &parent_columns, Some("pk_product")),
            create_table("tb_product_translation", &translation_columns, Some("fk_product, locale")),
        );
        let entities = sql_entities(&sql);
        let first = merge(&entities[0], &entities[1]);
        let second = merge(&entities[0], &entities[1]);

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.to_json().to_string(), second.to_json().to_string());
        for name in &translatable {
            prop_assert!(!first.contains(name));
        }
    }

    #[test]
    fn test_name_inference_is_total(names in prop::collection::vec("[a-z][a-zA-Z_]{0,12}", 0..6)) {
        let inferred = infer_common_entity_name(&names);
        prop_assert!(!inferred.is_empty());
        prop_assert_eq!(inferred, infer_common_entity_name(&names));
    }

    #[test]
    fn test_canonical_map_round_trip(columns in arb_columns()) {
        let entities = sql_entities(&create_table("tb_item", &columns, None));
        let entity = &entities[0];
        let fields = MergedFieldMap::from_entity(entity);
        let detection = PatternOrchestrator::new().detect(entity);
        let view = EntityView { entity, fields: &fields, detection: &detection, actions: None };

        let text = serde_json::to_string(&entity_map(view, true)).unwrap();
        let reparsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        let reparsed_fields = reparsed["fields"].as_object().unwrap();

        let names: Vec<&str> = reparsed_fields.keys().map(String::as_str).collect();
        let expected: Vec<&str> = entity.field_names().collect();
        prop_assert_eq!(names, expected);
        for field in entity.fields() {
            let expr = reparsed_fields[&field.name].as_str().unwrap();
            prop_assert_eq!(parse_type_expression(expr).tier, field.type_tier);
            prop_assert_eq!(parse_type_expression(expr).nullable, field.nullable);
        }
    }

    #[test]
    fn test_explicit_reference_beats_id_suffix(
        column in prop::sample::select(vec!["owner_id", "parent_id", "creator_id"]),
        target in prop::sample::select(vec!["account", "organization", "warehouse"]),
    ) {
        let sql = format!("CREATE TABLE tb_asset ({column} INTEGER REFERENCES tb_{target}(id));");
        let entities = sql_entities(&sql);
        let field = entities[0].field(column).unwrap();
        let expected = entity_name(&format!("tb_{target}"));
        prop_assert_eq!(field.type_expression(), format!("ref({expected})"));
    }
}
