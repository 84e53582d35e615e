//! Canonical action: one operation exposed by a route, handler, or repository.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::SourceRef;

/// CRUD classification of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrudKind {
    Create,
    Read,
    Update,
    Delete,
    Custom,
}

impl CrudKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Custom => "custom",
        }
    }
}

/// How an action was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Full grammar traversal.
    Grammar,
    /// Regex over flattened source text.
    TextPattern,
    /// Function or method name only.
    NameHeuristic,
}

impl ExtractionMethod {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Grammar => "grammar",
            Self::TextPattern => "text_pattern",
            Self::NameHeuristic => "name_heuristic",
        }
    }
}

/// One storage operation an action performs on its entity. Serializes as a
/// single-key map: `{"insert": "Order"}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionStep {
    Insert(String),
    Select(String),
    Update(String),
    Delete(String),
    /// `<action>_<Entity>` for operations with no CRUD counterpart.
    Custom(String),
}

impl ActionStep {
    pub fn for_action(kind: CrudKind, action: &str, entity: &str) -> Self {
        let entity = entity.to_string();
        match kind {
            CrudKind::Create => Self::Insert(entity),
            CrudKind::Read => Self::Select(entity),
            CrudKind::Update => Self::Update(entity),
            CrudKind::Delete => Self::Delete(entity),
            CrudKind::Custom => Self::Custom(format!("{action}_{entity}")),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Insert(_) => "insert",
            Self::Select(_) => "select",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Custom(_) => "custom",
        }
    }

    pub fn target(&self) -> &str {
        match self {
            Self::Insert(t) | Self::Select(t) | Self::Update(t) | Self::Delete(t) | Self::Custom(t) => t,
        }
    }
}

/// Where a parameter is bound from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamLocation {
    Path,
    Query,
    Body,
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionParameter {
    pub name: String,
    pub type_hint: Option<String>,
    pub location: ParamLocation,
}

impl ActionParameter {
    pub fn new(name: impl Into<String>, type_hint: Option<String>, location: ParamLocation) -> Self {
        Self {
            name: name.into(),
            type_hint,
            location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalAction {
    pub name: String,
    pub crud_kind: CrudKind,
    /// Uppercase HTTP verb, when the action is a route.
    pub http_method: Option<String>,
    pub path: Option<String>,
    pub parameters: SmallVec<[ActionParameter; 4]>,
    pub is_async: bool,
    pub framework: Option<String>,
    pub confidence: f64,
    pub extraction_method: ExtractionMethod,
    pub source: SourceRef,
    /// Name of the owning construct (class, impl block, repository), if any.
    pub owner: Option<String>,
    /// Filled in once the action is attributed to an entity.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<ActionStep>,
}

impl CanonicalAction {
    /// A grammar-extracted action with its CRUD kind inferred from the name.
    pub fn new(name: impl Into<String>, confidence: f64, source: SourceRef) -> Self {
        let name = name.into();
        Self {
            crud_kind: crate::actions::crud::crud_from_name(&name),
            name,
            http_method: None,
            path: None,
            parameters: SmallVec::new(),
            is_async: false,
            framework: None,
            confidence,
            extraction_method: ExtractionMethod::Grammar,
            source,
            owner: None,
            steps: Vec::new(),
        }
    }

    /// Attach an HTTP route; the CRUD kind follows the method.
    pub fn with_route(mut self, method: &str, path: impl Into<String>) -> Self {
        let method = method.to_ascii_uppercase();
        if let Some(kind) = crate::actions::crud::crud_from_http(&method) {
            self.crud_kind = kind;
        }
        self.http_method = Some(method);
        self.path = Some(path.into());
        self
    }

    pub fn with_crud(mut self, kind: CrudKind) -> Self {
        self.crud_kind = kind;
        self
    }

    pub fn with_framework(mut self, framework: impl Into<String>) -> Self {
        self.framework = Some(framework.into());
        self
    }

    pub fn with_method(mut self, method: ExtractionMethod) -> Self {
        self.extraction_method = method;
        self
    }

    pub fn with_async(mut self, is_async: bool) -> Self {
        self.is_async = is_async;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_parameters(mut self, parameters: impl IntoIterator<Item = ActionParameter>) -> Self {
        self.parameters = parameters.into_iter().collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::language::SourceLanguage;

    fn src() -> SourceRef {
        SourceRef::new(SourceLanguage::Python, "users.py")
    }

    #[test]
    fn test_route_sets_crud_from_method() {
        let action = CanonicalAction::new("handler", 0.95, src()).with_route("delete", "/users/{id}");
        assert_eq!(action.crud_kind, CrudKind::Delete);
        assert_eq!(action.http_method.as_deref(), Some("DELETE"));
    }

    #[test]
    fn test_name_sets_initial_crud() {
        assert_eq!(CanonicalAction::new("create_user", 0.7, src()).crud_kind, CrudKind::Create);
        assert_eq!(CanonicalAction::new("ping", 0.7, src()).crud_kind, CrudKind::Custom);
    }

    #[test]
    fn test_unknown_http_method_keeps_name_kind() {
        let action = CanonicalAction::new("listUsers", 0.9, src()).with_route("OPTIONS", "/users");
        assert_eq!(action.crud_kind, CrudKind::Read);
    }

    #[test]
    fn test_steps_follow_crud_kind() {
        assert_eq!(
            ActionStep::for_action(CrudKind::Create, "create_order", "Order"),
            ActionStep::Insert("Order".into())
        );
        assert_eq!(ActionStep::for_action(CrudKind::Read, "list", "Order").kind(), "select");
        let custom = ActionStep::for_action(CrudKind::Custom, "publish", "Article");
        assert_eq!(custom.target(), "publish_Article");
        assert_eq!(serde_json::to_value(&custom).unwrap(), serde_json::json!({"custom": "publish_Article"}));
    }
}
