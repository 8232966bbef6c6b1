//! Migration directives and their fixed group order.

use crate::sql::ColumnType;
use serde::{Deserialize, Serialize};

fn default_field_type() -> String {
    ColumnType::DEFAULT.to_string()
}

/// Drop a table that is no longer used, if it is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoveTable {
    /// Table to drop.
    pub table_name: String,
}

impl RemoveTable {
    /// Create a remove directive.
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }
}

/// Move a column, and its data, from one table to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldMove {
    /// Table the field lives in now.
    pub owner_current: String,
    /// Table the field moves to.
    pub owner_new: String,
    /// Current column name.
    pub field_name_current: String,
    /// Column name in the new table (may equal the current one).
    pub field_name_new: String,
    /// Column type used when the source column is retired.
    #[serde(default = "default_field_type")]
    pub field_type: String,
}

impl FieldMove {
    /// Create a db_field move with an explicit column type.
    pub fn new(
        owner_current: impl Into<String>,
        owner_new: impl Into<String>,
        field_name_current: impl Into<String>,
        field_name_new: impl Into<String>,
        field_type: impl Into<String>,
    ) -> Self {
        Self {
            owner_current: owner_current.into(),
            owner_new: owner_new.into(),
            field_name_current: field_name_current.into(),
            field_name_new: field_name_new.into(),
            field_type: field_type.into(),
        }
    }

    /// Create a has_one move; foreign keys are always integers.
    pub fn has_one(
        owner_current: impl Into<String>,
        owner_new: impl Into<String>,
        field_name_current: impl Into<String>,
        field_name_new: impl Into<String>,
    ) -> Self {
        Self::new(
            owner_current,
            owner_new,
            field_name_current,
            field_name_new,
            ColumnType::DEFAULT,
        )
    }
}

/// A has_one relation move as written in configuration.
///
/// Has no `field_type`: the foreign key is always moved as `INT`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HasOne {
    /// Table the relation lives in now.
    pub owner_current: String,
    /// Table the relation moves to.
    pub owner_new: String,
    /// Current foreign key column.
    pub field_name_current: String,
    /// Foreign key column in the new table.
    pub field_name_new: String,
}

impl From<HasOne> for FieldMove {
    fn from(h: HasOne) -> Self {
        FieldMove::has_one(
            h.owner_current,
            h.owner_new,
            h.field_name_current,
            h.field_name_new,
        )
    }
}

/// Re-point a many_many join table from one owner to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManyMany {
    /// Owner the relation is moved away from.
    pub owner_current: String,
    /// Owner the relation is moved to.
    pub owner_new: String,
    /// Relation name, e.g. `Categories` in `Page_Categories`.
    pub field_name: String,
}

impl ManyMany {
    /// Create a many_many directive.
    pub fn new(
        owner_current: impl Into<String>,
        owner_new: impl Into<String>,
        field_name: impl Into<String>,
    ) -> Self {
        Self {
            owner_current: owner_current.into(),
            owner_new: owner_new.into(),
            field_name: field_name.into(),
        }
    }
}

/// A single schema transformation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MigrationDirective {
    /// Drop an empty table.
    RemoveTable(RemoveTable),
    /// Move a db field or has_one foreign key.
    FieldMove(FieldMove),
    /// Re-point a many_many join table.
    ManyMany(ManyMany),
}

/// Directive groups, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DirectiveGroup {
    /// Obsolete table removal.
    RemoveTable,
    /// Plain column moves.
    DbField,
    /// has_one foreign key moves.
    HasOne,
    /// many_many join table moves.
    ManyMany,
}

impl DirectiveGroup {
    /// Execution order. Removal runs first so later groups see a clean schema.
    pub const ORDER: [DirectiveGroup; 4] = [
        DirectiveGroup::RemoveTable,
        DirectiveGroup::DbField,
        DirectiveGroup::HasOne,
        DirectiveGroup::ManyMany,
    ];

    /// Configuration key of the group.
    pub fn key(&self) -> &'static str {
        match self {
            DirectiveGroup::RemoveTable => "remove_table",
            DirectiveGroup::DbField => "db_field",
            DirectiveGroup::HasOne => "has_one",
            DirectiveGroup::ManyMany => "many_many",
        }
    }

    /// Heading shown above the group's results.
    pub fn title(&self) -> &'static str {
        match self {
            DirectiveGroup::RemoveTable => "Removing obsolete tables",
            DirectiveGroup::DbField => "Moving db_fields",
            DirectiveGroup::HasOne => "Moving has_one relations",
            DirectiveGroup::ManyMany => "Migrating many_many relations",
        }
    }
}

impl std::fmt::Display for DirectiveGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// The full, ordered input of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MigrationSet {
    /// Tables to drop when empty.
    #[serde(default)]
    pub remove_table: Vec<RemoveTable>,
    /// Plain column moves.
    #[serde(default)]
    pub db_field: Vec<FieldMove>,
    /// has_one foreign key moves.
    #[serde(default)]
    pub has_one: Vec<HasOne>,
    /// many_many join table moves.
    #[serde(default)]
    pub many_many: Vec<ManyMany>,
}

impl MigrationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table removal.
    pub fn with_remove_table(mut self, directive: RemoveTable) -> Self {
        self.remove_table.push(directive);
        self
    }

    /// Add a db field move.
    pub fn with_db_field(mut self, directive: FieldMove) -> Self {
        self.db_field.push(directive);
        self
    }

    /// Add a has_one move.
    pub fn with_has_one(mut self, directive: HasOne) -> Self {
        self.has_one.push(directive);
        self
    }

    /// Add a many_many move.
    pub fn with_many_many(mut self, directive: ManyMany) -> Self {
        self.many_many.push(directive);
        self
    }

    /// Total number of directives.
    pub fn len(&self) -> usize {
        self.remove_table.len() + self.db_field.len() + self.has_one.len() + self.many_many.len()
    }

    /// Whether there is nothing to do.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Directives of one group, in configured order.
    pub fn group(&self, group: DirectiveGroup) -> Vec<MigrationDirective> {
        match group {
            DirectiveGroup::RemoveTable => self
                .remove_table
                .iter()
                .cloned()
                .map(MigrationDirective::RemoveTable)
                .collect(),
            DirectiveGroup::DbField => self
                .db_field
                .iter()
                .cloned()
                .map(MigrationDirective::FieldMove)
                .collect(),
            DirectiveGroup::HasOne => self
                .has_one
                .iter()
                .cloned()
                .map(|h| MigrationDirective::FieldMove(h.into()))
                .collect(),
            DirectiveGroup::ManyMany => self
                .many_many
                .iter()
                .cloned()
                .map(MigrationDirective::ManyMany)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders_fill_each_group() {
        let set = MigrationSet::new()
            .with_many_many(ManyMany::new("Page", "NewsPage", "Categories"))
            .with_has_one(HasOne {
                owner_current: "Page".to_string(),
                owner_new: "NewsPage".to_string(),
                field_name_current: "AuthorID".to_string(),
                field_name_new: "AuthorID".to_string(),
            })
            .with_db_field(FieldMove::new("Page", "NewsPage", "Summary", "Summary", "Text"))
            .with_remove_table(RemoveTable::new("OldTable"));

        let groups: Vec<_> = DirectiveGroup::ORDER
            .iter()
            .filter(|&&g| !set.group(g).is_empty())
            .copied()
            .collect();
        assert_eq!(groups, DirectiveGroup::ORDER.to_vec());
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_has_one_uses_integer_type() {
        let set = MigrationSet::new().with_has_one(HasOne {
            owner_current: "Page".to_string(),
            owner_new: "NewsPage".to_string(),
            field_name_current: "AuthorID".to_string(),
            field_name_new: "WriterID".to_string(),
        });

        match &set.group(DirectiveGroup::HasOne)[0] {
            MigrationDirective::FieldMove(m) => {
                assert_eq!(m.field_type, "INT");
                assert_eq!(m.field_name_new, "WriterID");
            }
            other => panic!("unexpected directive: {:?}", other),
        }
    }

    #[test]
    fn test_group_titles() {
        assert_eq!(DirectiveGroup::RemoveTable.title(), "Removing obsolete tables");
        assert_eq!(DirectiveGroup::ManyMany.key(), "many_many");
        assert!(MigrationSet::new().is_empty());
    }
}
