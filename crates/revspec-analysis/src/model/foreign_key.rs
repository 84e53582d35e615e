use serde::{Deserialize, Serialize};

/// A resolved foreign-key relationship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub source_column: String,
    pub constraint_name: Option<String>,
    pub target_schema: Option<String>,
    pub target_table: String,
    pub target_column: Option<String>,
    /// Entity name inferred from `target_table`.
    pub target_entity: String,
}

impl ForeignKey {
    pub fn new(
        source_column: impl Into<String>,
        target_table: impl Into<String>,
        target_entity: impl Into<String>,
    ) -> Self {
        Self {
            source_column: source_column.into(),
            constraint_name: None,
            target_schema: None,
            target_table: target_table.into(),
            target_column: None,
            target_entity: target_entity.into(),
        }
    }

    pub fn with_constraint_name(mut self, name: impl Into<String>) -> Self {
        self.constraint_name = Some(name.into());
        self
    }

    pub fn with_target_schema(mut self, schema: impl Into<String>) -> Self {
        self.target_schema = Some(schema.into());
        self
    }

    pub fn with_target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }
}
