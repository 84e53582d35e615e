//! Universal action mapper: group a mixed-language action stream by the
//! entity each action operates on.
//!
//! Inference per action, first hit wins:
//!
//! 1. the file stem with a technical suffix removed (`user_controller.py`);
//! 2. the owning construct (`OrderController`, `ArticleViewSet`);
//! 3. the first resource segment of the route path (`/api/orders/{id}`);
//! 4. the most common subject token across the file's remaining actions;
//! 5. the `Entity` overflow bucket.

use std::path::Path;

use rayon::prelude::*;
use revspec_core::constants::FALLBACK_ENTITY_NAME;
use revspec_core::FxHashMap;
use serde::Serialize;

use crate::extractors::naming::{entity_name, infer_common_entity_name, singularize, strip_technical_affixes};
use crate::language::SourceLanguage;
use crate::model::{ActionStep, CanonicalAction, CanonicalEntity, ExtractionMethod};

const FILE_STEM_SUFFIXES: &[&str] = &[
    "_controller",
    "_handler",
    "_service",
    "_repository",
    "_views",
    "_view",
    "_api",
    "_routes",
];

/// Owner suffixes beyond the shared technical affixes.
const OWNER_SUFFIXES: &[&str] = &["ViewSet", "View", "Handler", "Resource", "Routes", "Api"];

/// Provenance of one entity's action group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionMetadata {
    /// File of the group's first action.
    pub source_file: String,
    pub source_language: SourceLanguage,
    /// Weakest extraction method in the group.
    pub extraction_method: ExtractionMethod,
    pub total_actions: usize,
    /// Field count of the same-named entity in the batch, 0 when none.
    pub total_fields: usize,
}

/// Every action attributed to one entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityActions {
    pub name: String,
    pub description: String,
    pub actions: Vec<CanonicalAction>,
    #[serde(rename = "_metadata")]
    pub metadata: ActionMetadata,
}

/// Groups actions by inferred entity.
#[derive(Debug, Clone, Default)]
pub struct UniversalActionMapper;

impl UniversalActionMapper {
    pub fn new() -> Self {
        Self
    }

    /// Partition `actions` into one group per entity. No action is dropped.
    /// Groups are ordered by entity name with the `Entity` bucket last;
    /// actions keep their input order within a group.
    pub fn map(&self, actions: &[CanonicalAction], entities: &[CanonicalEntity]) -> Vec<EntityActions> {
        // Shard by source file; the common-token rule needs a whole file.
        let mut files: Vec<(&Path, Vec<usize>)> = Vec::new();
        let mut file_index: FxHashMap<&Path, usize> = FxHashMap::default();
        for (i, action) in actions.iter().enumerate() {
            let file = action.source.file.as_path();
            let slot = *file_index.entry(file).or_insert_with(|| {
                files.push((file, Vec::new()));
                files.len() - 1
            });
            files[slot].1.push(i);
        }

        let partials: Vec<Vec<(String, usize)>> = files
            .par_iter()
            .map(|(file, indices)| assign_file(file, indices, actions))
            .collect();

        let mut groups: FxHashMap<String, Vec<usize>> = FxHashMap::default();
        for (entity, index) in partials.into_iter().flatten() {
            groups.entry(entity).or_default().push(index);
        }

        let mut names: Vec<String> = groups.keys().cloned().collect();
        names.sort_by(|a, b| {
            (a == FALLBACK_ENTITY_NAME)
                .cmp(&(b == FALLBACK_ENTITY_NAME))
                .then_with(|| a.cmp(b))
        });

        names
            .into_iter()
            .filter_map(|name| {
                let mut indices = groups.remove(&name)?;
                indices.sort_unstable();
                let group: Vec<CanonicalAction> = indices
                    .iter()
                    .map(|&i| with_steps(actions[i].clone(), &name))
                    .collect();
                Some(build_group(name, group, entities))
            })
            .collect()
    }
}

/// Entity for every action of one file, as `(entity, action index)` pairs.
fn assign_file(file: &Path, indices: &[usize], actions: &[CanonicalAction]) -> Vec<(String, usize)> {
    let from_stem = entity_from_file_stem(file);
    let mut assigned: Vec<(Option<String>, usize)> = indices
        .iter()
        .map(|&i| {
            let action = &actions[i];
            let entity = from_stem
                .clone()
                .or_else(|| action.owner.as_deref().map(entity_from_owner))
                .or_else(|| action.path.as_deref().and_then(entity_from_path));
            (entity, i)
        })
        .collect();

    let leftover: Vec<&str> = assigned
        .iter()
        .filter(|(entity, _)| entity.is_none())
        .map(|(_, i)| actions[*i].name.as_str())
        .collect();
    let common = (!leftover.is_empty()).then(|| infer_common_entity_name(&leftover));

    assigned
        .drain(..)
        .map(|(entity, i)| {
            let entity = entity
                .or_else(|| common.clone())
                .unwrap_or_else(|| FALLBACK_ENTITY_NAME.to_string());
            (entity, i)
        })
        .collect()
}

/// `user_controller.py` gives `User`, `order_items_routes.ts` gives
/// `OrderItem`; stems without a known suffix give none.
pub fn entity_from_file_stem(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?.to_ascii_lowercase();
    FILE_STEM_SUFFIXES
        .iter()
        .find_map(|suffix| stem.strip_suffix(suffix))
        .filter(|rest| !rest.is_empty())
        .map(|rest| entity_name(&singularize(rest)))
}

/// `OrderController` gives `Order`, `ArticleViewSet` gives `Article`.
pub fn entity_from_owner(owner: &str) -> String {
    let base = strip_technical_affixes(owner);
    let base = OWNER_SUFFIXES
        .iter()
        .find_map(|suffix| base.strip_suffix(suffix).filter(|rest| !rest.is_empty()))
        .unwrap_or(base);
    entity_name(base)
}

/// First segment that is neither `api`, a version, nor a parameter,
/// singularized: `/api/v1/categories/{id}` gives `Category`.
pub fn entity_from_path(path: &str) -> Option<String> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .find(|s| {
            let is_param = s.starts_with('{') || s.starts_with(':') || s.starts_with('<') || s.starts_with('[');
            let is_version = s.len() > 1 && s.starts_with('v') && s[1..].chars().all(|c| c.is_ascii_digit());
            !is_param && !is_version && !s.eq_ignore_ascii_case("api")
        })
        .map(|s| entity_name(&singularize(s)))
}

/// Derive the action's storage steps from its CRUD kind and entity.
fn with_steps(mut action: CanonicalAction, entity: &str) -> CanonicalAction {
    action.steps = vec![ActionStep::for_action(action.crud_kind, &action.name, entity)];
    action
}

fn method_rank(method: ExtractionMethod) -> u8 {
    match method {
        ExtractionMethod::Grammar => 0,
        ExtractionMethod::TextPattern => 1,
        ExtractionMethod::NameHeuristic => 2,
    }
}

fn build_group(name: String, actions: Vec<CanonicalAction>, entities: &[CanonicalEntity]) -> EntityActions {
    let first = &actions[0].source;
    let source_file = first.file.to_string_lossy().replace('\\', "/");
    let source_language = first.language;
    let extraction_method = actions
        .iter()
        .map(|a| a.extraction_method)
        .max_by_key(|m| method_rank(*m))
        .unwrap_or(ExtractionMethod::Grammar);
    let total_fields = entities
        .iter()
        .find(|e| e.name == name)
        .map_or(0, |e| e.fields().len());
    let description = format!("Actions extracted from {source_language} file {source_file}");
    EntityActions {
        metadata: ActionMetadata {
            source_file,
            source_language,
            extraction_method,
            total_actions: actions.len(),
            total_fields,
        },
        name,
        description,
        actions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SourceRef;

    fn action(name: &str, file: &str, language: SourceLanguage) -> CanonicalAction {
        CanonicalAction::new(name, 0.95, SourceRef::new(language, file))
    }

    #[test]
    fn test_file_stem_rule() {
        assert_eq!(entity_from_file_stem(Path::new("src/user_controller.py")).as_deref(), Some("User"));
        assert_eq!(entity_from_file_stem(Path::new("order_items_routes.ts")).as_deref(), Some("OrderItem"));
        assert_eq!(entity_from_file_stem(Path::new("categories_api.py")).as_deref(), Some("Category"));
        assert_eq!(entity_from_file_stem(Path::new("address_service.rs")).as_deref(), Some("Address"));
        assert_eq!(entity_from_file_stem(Path::new("article_views.py")).as_deref(), Some("Article"));
        assert_eq!(entity_from_file_stem(Path::new("routes.ts")), None);
        assert_eq!(entity_from_file_stem(Path::new("_api.py")), None);
    }

    #[test]
    fn test_owner_and_path_rules() {
        assert_eq!(entity_from_owner("OrderController"), "Order");
        assert_eq!(entity_from_owner("ArticleViewSet"), "Article");
        assert_eq!(entity_from_owner("View"), "View");
        assert_eq!(entity_from_path("/api/v1/categories/{id}").as_deref(), Some("Category"));
        assert_eq!(entity_from_path("/api/{id}"), None);
    }

    #[test]
    fn test_groups_across_languages() {
        let actions = vec![
            action("createUser", "user_service.rs", SourceLanguage::Rust),
            action("list", "routes.ts", SourceLanguage::TypeScript).with_route("GET", "/api/orders"),
            action("findById", "Repo.java", SourceLanguage::Java).with_owner("UserRepository"),
            action("ping", "misc.py", SourceLanguage::Python),
        ];
        let groups = UniversalActionMapper::new().map(&actions, &[]);
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Order", "Ping", "User"]);
        let user = &groups[2];
        assert_eq!(user.actions.len(), 2);
        assert_eq!(user.actions[0].steps, vec![ActionStep::Insert("User".into())]);
        assert_eq!(groups[0].actions[0].steps, vec![ActionStep::Select("Order".into())]);
        assert_eq!(groups[1].actions[0].steps, vec![ActionStep::Custom("ping_Ping".into())]);
        assert_eq!(user.metadata.total_actions, 2);
        assert_eq!(user.metadata.source_file, "user_service.rs");
        assert_eq!(user.metadata.source_language, SourceLanguage::Rust);
        let total: usize = groups.iter().map(|g| g.actions.len()).sum();
        assert_eq!(total, actions.len());
    }

    #[test]
    fn test_common_token_and_overflow_bucket() {
        let actions = vec![
            action("create_invoice", "billing.py", SourceLanguage::Python),
            action("get_invoice", "billing.py", SourceLanguage::Python),
            action("create_user", "misc.py", SourceLanguage::Python),
            action("get_order", "misc.py", SourceLanguage::Python),
        ];
        let groups = UniversalActionMapper::new().map(&actions, &[]);
        let names: Vec<&str> = groups.iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, vec!["Invoice", "Entity"]);
        assert_eq!(groups[1].actions.len(), 2);
    }

    #[test]
    fn test_weakest_method_and_field_count() {
        use crate::patterns::test_support::entity;
        let mut heuristic = action("delete_user", "user_api.py", SourceLanguage::Python);
        heuristic.extraction_method = ExtractionMethod::NameHeuristic;
        let actions = vec![action("get_user", "user_api.py", SourceLanguage::Python), heuristic];
        let user = entity("user", &[("id", "INTEGER"), ("email", "TEXT")], &["id"]);
        let groups = UniversalActionMapper::new().map(&actions, &[user]);
        assert_eq!(groups[0].metadata.extraction_method, ExtractionMethod::NameHeuristic);
        assert_eq!(groups[0].metadata.total_fields, 2);
    }

    #[test]
    fn test_metadata_key_name() {
        let actions = vec![action("get_user", "user_api.py", SourceLanguage::Python)];
        let groups = UniversalActionMapper::new().map(&actions, &[]);
        let json = serde_json::to_value(&groups[0]).unwrap();
        assert_eq!(json["_metadata"]["source_language"], "python");
        assert_eq!(json["_metadata"]["extraction_method"], "grammar");
    }
}
