//! Canonical field and type tier.

use serde::{Deserialize, Serialize};

/// Tier of a canonical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTier {
    /// Primitive storage types: `text`, `integer`, `boolean`, ...
    Basic,
    /// Semantically rich scalars: `email`, `uuid`, `money`, ...
    Scalar,
    /// Structured values stored inline.
    Composite,
    /// Pointer to another entity.
    Reference,
}

impl TypeTier {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Scalar => "scalar",
            Self::Composite => "composite",
            Self::Reference => "reference",
        }
    }
}

/// One field of a canonical entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalField {
    pub name: String,
    pub type_tier: TypeTier,
    /// Bare canonical type name used in type expressions. For references this
    /// is the target entity name.
    pub canonical_type: String,
    /// Type token as written in the source.
    pub native_type: String,
    pub postgres_type: String,
    pub nullable: bool,
    pub default: Option<String>,
    pub reference_target: Option<String>,
    pub enum_values: Option<Vec<String>>,
    pub is_list: bool,
    pub description: Option<String>,
}

impl CanonicalField {
    pub fn new(
        name: impl Into<String>,
        type_tier: TypeTier,
        canonical_type: impl Into<String>,
        native_type: impl Into<String>,
        postgres_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            type_tier,
            canonical_type: canonical_type.into(),
            native_type: native_type.into(),
            postgres_type: postgres_type.into(),
            nullable: true,
            default: None,
            reference_target: None,
            enum_values: None,
            is_list: false,
            description: None,
        }
    }

    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_list(mut self, is_list: bool) -> Self {
        self.is_list = is_list;
        self
    }

    pub fn with_enum_values(mut self, values: Vec<String>) -> Self {
        self.enum_values = (!values.is_empty()).then_some(values);
        self
    }

    /// Turn this field into a reference to `target`.
    pub fn with_reference(mut self, target: impl Into<String>) -> Self {
        self.set_reference(target);
        self
    }

    pub fn set_reference(&mut self, target: impl Into<String>) {
        let target = target.into();
        self.type_tier = TypeTier::Reference;
        self.canonical_type = target.clone();
        self.reference_target = Some(target);
    }

    pub fn is_reference(&self) -> bool {
        self.type_tier == TypeTier::Reference
    }

    /// Render the field's type expression: `text!`, `ref(User)`, `enum(a, b)`, `tag[]`.
    pub fn type_expression(&self) -> String {
        let mut expr = match (&self.enum_values, self.type_tier) {
            (Some(values), _) if !values.is_empty() => format!("enum({})", values.join(", ")),
            (_, TypeTier::Reference) => {
                let target = self
                    .reference_target
                    .as_deref()
                    .unwrap_or(&self.canonical_type);
                format!("ref({target})")
            }
            _ => self.canonical_type.clone(),
        };
        if self.is_list {
            expr.push_str("[]");
        }
        if !self.nullable {
            expr.push('!');
        }
        expr
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(name: &str) -> CanonicalField {
        CanonicalField::new(name, TypeTier::Basic, "text", "TEXT", "TEXT")
    }

    #[test]
    fn test_type_expression_forms() {
        assert_eq!(text("title").type_expression(), "text");
        assert_eq!(text("title").with_nullable(false).type_expression(), "text!");
        assert_eq!(
            text("owner_id").with_reference("User").with_nullable(false).type_expression(),
            "ref(User)!"
        );
        assert_eq!(text("tags").with_list(true).type_expression(), "text[]");
        assert_eq!(
            text("role")
                .with_enum_values(vec!["user".into(), "admin".into()])
                .type_expression(),
            "enum(user, admin)"
        );
    }

    #[test]
    fn test_empty_enum_values_are_dropped() {
        assert!(text("role").with_enum_values(Vec::new()).enum_values.is_none());
    }

    #[test]
    fn test_tier_serializes_snake_case() {
        let json = serde_json::to_string(&TypeTier::Reference).unwrap();
        assert_eq!(json, "\"reference\"");
    }
}
