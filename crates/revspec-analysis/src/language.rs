//! Source language detection from file extension and content.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Source languages the extractors understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    Sql,
    Prisma,
    TypeScript,
    Rust,
    Java,
    Python,
}

impl SourceLanguage {
    /// Detect language from a file extension string.
    pub fn from_extension(ext: Option<&str>) -> Option<SourceLanguage> {
        match ext?.to_ascii_lowercase().as_str() {
            "sql" | "ddl" | "psql" => Some(Self::Sql),
            "prisma" => Some(Self::Prisma),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            "rs" => Some(Self::Rust),
            "java" => Some(Self::Java),
            "py" | "pyi" => Some(Self::Python),
            _ => None,
        }
    }

    /// Detect language from a path's extension.
    pub fn from_path(path: &Path) -> Option<SourceLanguage> {
        Self::from_extension(path.extension().and_then(|e| e.to_str()))
    }

    /// Extension first, then a content sniff for extensionless or unusual files.
    pub fn detect(path: &Path, content: &str) -> Option<SourceLanguage> {
        Self::from_path(path).or_else(|| Self::sniff(content))
    }

    /// Guess the language from distinctive top-level constructs.
    pub fn sniff(content: &str) -> Option<SourceLanguage> {
        let upper_head: String = content.chars().take(4096).collect::<String>().to_uppercase();
        if upper_head.contains("CREATE TABLE") || upper_head.contains("ALTER TABLE") {
            return Some(Self::Sql);
        }
        let has_line = |prefix: &str| content.lines().any(|l| l.trim_start().starts_with(prefix));
        if (has_line("model ") || has_line("enum "))
            && (has_line("datasource ") || has_line("generator ") || content.contains("@id"))
        {
            return Some(Self::Prisma);
        }
        if has_line("package ") && (content.contains("public class") || content.contains("@")) {
            return Some(Self::Java);
        }
        if has_line("fn ") || has_line("pub fn ") || (has_line("use ") && content.contains("::")) {
            return Some(Self::Rust);
        }
        if has_line("def ") || (has_line("from ") && content.contains(" import ")) {
            return Some(Self::Python);
        }
        if has_line("export ") || (has_line("import ") && content.contains(" from '")) {
            return Some(Self::TypeScript);
        }
        None
    }

    /// Returns all file extensions associated with this language.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Self::Sql => &["sql", "ddl", "psql"],
            Self::Prisma => &["prisma"],
            Self::TypeScript => &["ts", "tsx", "mts", "cts"],
            Self::Rust => &["rs"],
            Self::Java => &["java"],
            Self::Python => &["py", "pyi"],
        }
    }

    /// Lowercase name used in metadata and config keys.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sql => "sql",
            Self::Prisma => "prisma",
            Self::TypeScript => "typescript",
            Self::Rust => "rust",
            Self::Java => "java",
            Self::Python => "python",
        }
    }

    pub fn all() -> &'static [SourceLanguage] {
        &[
            Self::Sql,
            Self::Prisma,
            Self::TypeScript,
            Self::Rust,
            Self::Java,
            Self::Python,
        ]
    }
}

impl std::fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(SourceLanguage::from_extension(Some("sql")), Some(SourceLanguage::Sql));
        assert_eq!(SourceLanguage::from_extension(Some("TSX")), Some(SourceLanguage::TypeScript));
        assert_eq!(SourceLanguage::from_extension(Some("rb")), None);
        assert_eq!(SourceLanguage::from_extension(None), None);
    }

    #[test]
    fn test_sniff_sql_and_prisma() {
        assert_eq!(
            SourceLanguage::sniff("create table tb_user (id integer);"),
            Some(SourceLanguage::Sql)
        );
        let prisma = "datasource db {\n  provider = \"postgresql\"\n}\nmodel User {\n  id Int @id\n}\n";
        assert_eq!(SourceLanguage::sniff(prisma), Some(SourceLanguage::Prisma));
    }

    #[test]
    fn test_detect_prefers_extension() {
        let path = Path::new("schema/users.py");
        assert_eq!(
            SourceLanguage::detect(path, "CREATE TABLE x (id int);"),
            Some(SourceLanguage::Python)
        );
        assert_eq!(
            SourceLanguage::detect(Path::new("Dockerfile"), "hello"),
            None
        );
    }
}
