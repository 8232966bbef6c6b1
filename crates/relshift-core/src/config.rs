//! Loading directive files.
//!
//! A directive file is YAML or JSON. The four groups may sit at the top level
//! or under a `Migrate` key:
//!
//! ```yaml
//! Migrate:
//!   remove_table:
//!     - table_name: OldTable
//!   has_one:
//!     - owner_current: Page
//!       owner_new: NewsPage
//!       field_name_current: AuthorID
//!       field_name_new: AuthorID
//!   many_many:
//!     - owner_current: Page
//!       owner_new: NewsPage
//!       field_name: Categories
//! ```

use crate::directive::MigrationSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading a directive file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The YAML document is malformed.
    #[error("invalid YAML directives: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The JSON document is malformed.
    #[error("invalid JSON directives: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension is not recognised.
    #[error("unsupported directive file format: {0}")]
    UnsupportedFormat(String),
}

/// Key the directive groups may be nested under.
const WRAPPER_KEY: &str = "Migrate";

/// Parse a YAML directive document.
///
/// Unknown keys anywhere in the directive tree are errors.
pub fn parse_yaml(source: &str) -> Result<MigrationSet, ConfigError> {
    if source.trim().is_empty() {
        return Ok(MigrationSet::default());
    }
    let mut document: serde_yaml::Value = serde_yaml::from_str(source)?;
    if let Some(groups) = document
        .as_mapping_mut()
        .and_then(|m| m.remove(WRAPPER_KEY))
    {
        document = groups;
    }
    Ok(serde_yaml::from_value(document)?)
}

/// Parse a JSON directive document.
///
/// Unknown keys anywhere in the directive tree are errors.
pub fn parse_json(source: &str) -> Result<MigrationSet, ConfigError> {
    if source.trim().is_empty() {
        return Ok(MigrationSet::default());
    }
    let mut document: serde_json::Value = serde_json::from_str(source)?;
    if let Some(groups) = document
        .as_object_mut()
        .and_then(|m| m.remove(WRAPPER_KEY))
    {
        document = groups;
    }
    Ok(serde_json::from_value(document)?)
}

/// Load a directive file, choosing the parser by extension
/// (`.yml`, `.yaml` or `.json`).
pub fn load_migration_set(path: impl AsRef<Path>) -> Result<MigrationSet, ConfigError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let set = match extension.as_str() {
        "yml" | "yaml" => parse_yaml(&source)?,
        "json" => parse_json(&source)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };

    tracing::debug!(path = %path.display(), directives = set.len(), "loaded directives");
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::{DirectiveGroup, MigrationDirective};
    use std::io::Write;

    const WRAPPED: &str = r#"
Migrate:
  remove_table:
    - table_name: OldTable
  db_field:
    - owner_current: Page
      owner_new: NewsPage
      field_name_current: Summary
      field_name_new: Teaser
      field_type: Varchar(255)
    - owner_current: Page
      owner_new: NewsPage
      field_name_current: Rating
      field_name_new: Rating
  has_one:
    - owner_current: Page
      owner_new: NewsPage
      field_name_current: AuthorID
      field_name_new: AuthorID
  many_many:
    - owner_current: Page
      owner_new: NewsPage
      field_name: Categories
"#;

    #[test]
    fn test_parse_wrapped_yaml() {
        let set = parse_yaml(WRAPPED).unwrap();
        assert_eq!(set.remove_table[0].table_name, "OldTable");
        assert_eq!(set.db_field[0].field_type, "Varchar(255)");
        assert_eq!(set.db_field[1].field_type, "INT");
        assert_eq!(set.has_one.len(), 1);
        assert_eq!(set.many_many[0].field_name, "Categories");
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn test_parse_bare_json_with_missing_groups() {
        let set = parse_json(
            r#"{"many_many": [{"owner_current": "Page", "owner_new": "NewsPage", "field_name": "Tags"}]}"#,
        )
        .unwrap();
        assert!(set.remove_table.is_empty());
        match &set.group(DirectiveGroup::ManyMany)[0] {
            MigrationDirective::ManyMany(m) => assert_eq!(m.field_name, "Tags"),
            other => panic!("unexpected directive: {:?}", other),
        }
    }

    #[test]
    fn test_misspelled_key_inside_wrapper_is_rejected() {
        let source = "Migrate:
  remove_table:
    - tabel_name: OldTable
  many_many:
    - owner_current: Page
      owner_new: NewsPage
      field_name: Categories
";
        let err = parse_yaml(source).unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
        assert!(err.to_string().contains("tabel_name"), "{err}");
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let err = parse_json(r#"{"Migrate": {"many_to_many": []}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));

        let err = parse_yaml("remove_tables:\n  - table_name: OldTable\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_has_one_rejects_field_type() {
        let source = "has_one:
  - owner_current: Page
    owner_new: NewsPage
    field_name_current: AuthorID
    field_name_new: AuthorID
    field_type: Varchar(50)
";
        assert!(parse_yaml(source).is_err());
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_yaml("  \n").unwrap().is_empty());
        assert!(parse_json("").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_document() {
        let err = parse_yaml("remove_table:\n  - nope: [").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("migrate.yml");
        std::fs::File::create(&yaml_path)
            .unwrap()
            .write_all(WRAPPED.as_bytes())
            .unwrap();
        assert_eq!(load_migration_set(&yaml_path).unwrap().len(), 5);

        let toml_path = dir.path().join("migrate.toml");
        std::fs::write(&toml_path, "").unwrap();
        assert!(matches!(
            load_migration_set(&toml_path),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "toml"
        ));

        assert!(matches!(
            load_migration_set(dir.path().join("missing.yml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
