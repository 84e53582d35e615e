//! Canonical map: the ordered per-entity mapping handed to serializers.
//!
//! Key order is fixed: `entity`, `schema`, `description`, `fields`,
//! `patterns`, `actions`, `_metadata`.

use std::path::PathBuf;

use serde_json::{json, Map, Value};

use crate::actions::EntityActions;
use crate::model::{CanonicalAction, CanonicalEntity, ExtractionMethod, TypeTier};
use crate::patterns::DetectionResult;
use crate::translation::MergedFieldMap;

const BASIC_TYPES: &[&str] = &[
    "text", "integer", "bigint", "boolean", "decimal", "date", "time", "timestamp", "interval", "json", "binary",
];
const SCALAR_TYPES: &[&str] = &["uuid", "money", "ipAddress", "email", "url", "phoneNumber"];

/// Everything known about one entity after detection and mapping.
#[derive(Debug, Clone, Copy)]
pub struct EntityView<'a> {
    pub entity: &'a CanonicalEntity,
    /// Field map, merged with a translation table when one was paired.
    pub fields: &'a MergedFieldMap,
    pub detection: &'a DetectionResult,
    pub actions: Option<&'a EntityActions>,
}

/// Build the canonical map for one entity.
pub fn entity_map(view: EntityView<'_>, include_metadata: bool) -> Map<String, Value> {
    let EntityView {
        entity,
        fields,
        detection,
        actions,
    } = view;
    let mut map = Map::new();
    map.insert("entity".into(), Value::String(entity.name.clone()));
    map.insert("schema".into(), Value::String(entity.schema.clone()));
    map.insert(
        "description".into(),
        entity
            .description
            .clone()
            .map_or(Value::Null, Value::String),
    );
    map.insert("fields".into(), fields.to_json());
    map.insert(
        "patterns".into(),
        Value::Array(
            detection
                .labels()
                .into_iter()
                .map(|l| Value::String(l.to_string()))
                .collect(),
        ),
    );
    let action_list = actions.map(|g| g.actions.as_slice()).unwrap_or_default();
    map.insert("actions".into(), Value::Array(action_list.iter().map(action_json).collect()));

    if include_metadata {
        let extraction_method = actions.map_or(ExtractionMethod::Grammar, |g| g.metadata.extraction_method);
        map.insert(
            "_metadata".into(),
            json!({
                "source_file": entity.source.file.to_string_lossy().replace('\\', "/"),
                "source_language": entity.source.language.name(),
                "extraction_method": extraction_method.name(),
                "total_actions": action_list.len(),
                "total_fields": entity.fields().len(),
                "pattern_confidence": detection.confidence,
            }),
        );
    }
    map
}

/// Canonical map for an action group with no matching entity.
pub fn actions_map(group: &EntityActions, default_schema: &str, include_metadata: bool) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("entity".into(), Value::String(group.name.clone()));
    map.insert("schema".into(), Value::String(default_schema.to_string()));
    map.insert("description".into(), Value::String(group.description.clone()));
    map.insert("fields".into(), Value::Object(Map::new()));
    map.insert("patterns".into(), Value::Array(Vec::new()));
    map.insert("actions".into(), Value::Array(group.actions.iter().map(action_json).collect()));
    if include_metadata {
        let meta = &group.metadata;
        map.insert(
            "_metadata".into(),
            json!({
                "source_file": meta.source_file,
                "source_language": meta.source_language.name(),
                "extraction_method": meta.extraction_method.name(),
                "total_actions": meta.total_actions,
                "total_fields": meta.total_fields,
            }),
        );
    }
    map
}

fn action_json(action: &CanonicalAction) -> Value {
    let mut map = Map::new();
    map.insert("name".into(), Value::String(action.name.clone()));
    map.insert("type".into(), Value::String(action.crud_kind.name().to_string()));
    if let Some(method) = &action.http_method {
        map.insert("http_method".into(), Value::String(method.clone()));
    }
    if let Some(path) = &action.path {
        map.insert("path".into(), Value::String(path.clone()));
    }
    if !action.parameters.is_empty() {
        let params = action
            .parameters
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "type": p.type_hint,
                    "in": p.location,
                })
            })
            .collect();
        map.insert("parameters".into(), Value::Array(params));
    }
    if action.is_async {
        map.insert("async".into(), Value::Bool(true));
    }
    if let Some(framework) = &action.framework {
        map.insert("framework".into(), Value::String(framework.clone()));
    }
    if !action.steps.is_empty() {
        let steps = action
            .steps
            .iter()
            .map(|step| {
                let mut entry = Map::new();
                entry.insert(step.kind().into(), Value::String(step.target().to_string()));
                Value::Object(entry)
            })
            .collect();
        map.insert("steps".into(), Value::Array(steps));
    }
    map.insert("confidence".into(), json!(action.confidence));
    map.insert(
        "extraction_method".into(),
        Value::String(action.extraction_method.name().to_string()),
    );
    Value::Object(map)
}

/// A type expression split back into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTypeExpression {
    /// Canonical type name, or the target for references.
    pub base: String,
    pub tier: TypeTier,
    pub enum_values: Option<Vec<String>>,
    pub is_list: bool,
    pub nullable: bool,
}

/// Parse `ref(User)[]!`, `enum(a, b)`, `email!`, `text`.
///
/// Unknown bare names are taken as composite types.
pub fn parse_type_expression(expr: &str) -> ParsedTypeExpression {
    let mut rest = expr.trim();
    let nullable = match rest.strip_suffix('!') {
        Some(r) => {
            rest = r;
            false
        }
        None => true,
    };
    let is_list = match rest.strip_suffix("[]") {
        Some(r) => {
            rest = r;
            true
        }
        None => false,
    };

    let (base, tier, enum_values) = if let Some(target) = rest.strip_prefix("ref(").and_then(|r| r.strip_suffix(')')) {
        (target.to_string(), TypeTier::Reference, None)
    } else if let Some(values) = rest.strip_prefix("enum(").and_then(|r| r.strip_suffix(')')) {
        let values = values.split(',').map(|v| v.trim().to_string()).collect();
        ("text".to_string(), TypeTier::Scalar, Some(values))
    } else if BASIC_TYPES.contains(&rest) {
        (rest.to_string(), TypeTier::Basic, None)
    } else if SCALAR_TYPES.contains(&rest) {
        (rest.to_string(), TypeTier::Scalar, None)
    } else {
        (rest.to_string(), TypeTier::Composite, None)
    };
    ParsedTypeExpression {
        base,
        tier,
        enum_values,
        is_list,
        nullable,
    }
}

/// Relative output location `schema/entity.yaml` for a serializer.
pub fn output_path(schema: &str, entity: &str) -> PathBuf {
    let schema = if schema.is_empty() { "public" } else { schema };
    PathBuf::from(schema).join(format!("{}.yaml", entity.to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patterns::test_support::entity;
    use crate::patterns::PatternOrchestrator;

    #[test]
    fn test_key_order() {
        let user = entity("tb_user", &[("id", "INTEGER"), ("email", "TEXT")], &["id"]);
        let fields = MergedFieldMap::from_entity(&user);
        let detection = PatternOrchestrator::new().detect(&user);
        let view = EntityView {
            entity: &user,
            fields: &fields,
            detection: &detection,
            actions: None,
        };
        let map = entity_map(view, true);
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec!["entity", "schema", "description", "fields", "patterns", "actions", "_metadata"]
        );
        assert_eq!(map["fields"]["email"], "email");
        assert_eq!(map["fields"]["id"], "integer!");
        assert_eq!(map["patterns"][0], "trinity");
        assert_eq!(map["_metadata"]["total_fields"], 2);

        let bare = entity_map(view, false);
        assert!(!bare.contains_key("_metadata"));
    }

    #[test]
    fn test_action_steps_serialized() {
        use crate::language::SourceLanguage;
        use crate::model::{ActionStep, SourceRef};

        let mut action = CanonicalAction::new("remove", 0.95, SourceRef::new(SourceLanguage::TypeScript, "orders.ts"))
            .with_route("DELETE", "/orders/:id");
        assert!(action_json(&action).get("steps").is_none());

        action.steps = vec![ActionStep::for_action(action.crud_kind, &action.name, "Order")];
        let json = action_json(&action);
        assert_eq!(json["steps"], json!([{ "delete": "Order" }]));
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(keys.last(), Some(&"extraction_method"));
    }

    #[test]
    fn test_parse_type_expression() {
        let parsed = parse_type_expression("ref(User)[]!");
        assert_eq!(parsed.tier, TypeTier::Reference);
        assert_eq!(parsed.base, "User");
        assert!(parsed.is_list);
        assert!(!parsed.nullable);

        let parsed = parse_type_expression("enum(draft, published)");
        assert_eq!(parsed.enum_values, Some(vec!["draft".to_string(), "published".to_string()]));
        assert!(parsed.nullable);

        assert_eq!(parse_type_expression("phoneNumber").tier, TypeTier::Scalar);
        assert_eq!(parse_type_expression("timestamp!").tier, TypeTier::Basic);
        assert_eq!(parse_type_expression("Address").tier, TypeTier::Composite);
    }

    #[test]
    fn test_output_path() {
        assert_eq!(output_path("catalog", "Manufacturer"), PathBuf::from("catalog/manufacturer.yaml"));
        assert_eq!(output_path("", "User"), PathBuf::from("public/user.yaml"));
    }
}
