//! Static per-language type tables.
//!
//! Every source type token maps to exactly one canonical type. Unknown tokens
//! map to Basic `text`.

use crate::model::{CanonicalField, TypeTier};

/// A canonical type name and its tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanonicalType {
    pub name: &'static str,
    pub tier: TypeTier,
}

const fn basic(name: &'static str) -> CanonicalType {
    CanonicalType {
        name,
        tier: TypeTier::Basic,
    }
}

const fn scalar(name: &'static str) -> CanonicalType {
    CanonicalType {
        name,
        tier: TypeTier::Scalar,
    }
}

pub const TEXT: CanonicalType = basic("text");
pub const INTEGER: CanonicalType = basic("integer");
pub const BIGINT: CanonicalType = basic("bigint");
pub const BOOLEAN: CanonicalType = basic("boolean");
pub const DECIMAL: CanonicalType = basic("decimal");
pub const DATE: CanonicalType = basic("date");
pub const TIME: CanonicalType = basic("time");
pub const TIMESTAMP: CanonicalType = basic("timestamp");
pub const INTERVAL: CanonicalType = basic("interval");
pub const JSON: CanonicalType = basic("json");
pub const BINARY: CanonicalType = basic("binary");
pub const UUID: CanonicalType = scalar("uuid");
pub const MONEY: CanonicalType = scalar("money");
pub const IP_ADDRESS: CanonicalType = scalar("ipAddress");
pub const EMAIL: CanonicalType = scalar("email");
pub const URL: CanonicalType = scalar("url");
pub const PHONE_NUMBER: CanonicalType = scalar("phoneNumber");

impl CanonicalType {
    /// PostgreSQL storage type for this canonical type.
    pub fn postgres_type(&self) -> &'static str {
        if self.tier == TypeTier::Composite {
            return "JSONB";
        }
        match self.name {
            "integer" => "INTEGER",
            "bigint" => "BIGINT",
            "boolean" => "BOOLEAN",
            "decimal" => "NUMERIC",
            "date" => "DATE",
            "time" => "TIME",
            "timestamp" => "TIMESTAMPTZ",
            "interval" => "INTERVAL",
            "json" => "JSONB",
            "binary" => "BYTEA",
            "uuid" => "UUID",
            "money" => "MONEY",
            "ipAddress" => "INET",
            _ => "TEXT",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self.name, "integer" | "bigint")
    }
}

/// Build a field for `name` with the mapped type, promoting rich scalars.
pub fn make_field(name: &str, native: &str, ty: CanonicalType) -> CanonicalField {
    let ty = promote_rich_scalar(name, ty);
    CanonicalField::new(name, ty.tier, ty.name, native, ty.postgres_type())
}

/// Text columns whose names denote an email, URL, or phone number become
/// the matching Scalar type.
pub fn promote_rich_scalar(name: &str, ty: CanonicalType) -> CanonicalType {
    if ty != TEXT {
        return ty;
    }
    let lower = crate::extractors::naming::to_snake_case(name);
    if lower == "email" || lower.ends_with("_email") {
        EMAIL
    } else if lower == "url" || lower.ends_with("_url") || lower == "website" {
        URL
    } else if lower == "phone" || lower.ends_with("_phone") {
        PHONE_NUMBER
    } else {
        ty
    }
}

/// Strip `(n)` modifiers and `[]` array suffixes; returns the base and whether
/// the type was an array.
fn sql_base(native: &str) -> (String, bool) {
    let trimmed = native.trim();
    let is_array = trimmed.ends_with("[]");
    let without_array = trimmed.trim_end_matches("[]");
    let base = without_array
        .split('(')
        .next()
        .unwrap_or(without_array)
        .trim()
        .to_ascii_uppercase();
    (base.split_whitespace().collect::<Vec<_>>().join(" "), is_array)
}

/// PostgreSQL type, including internal aliases, to canonical type.
/// Returns the canonical type and whether the column is an array.
pub fn sql_type(native: &str) -> (CanonicalType, bool) {
    let (base, is_array) = sql_base(native);
    let ty = match base.as_str() {
        "INTEGER" | "INT" | "INT4" | "SERIAL" | "SERIAL4" | "SMALLINT" | "INT2" | "SMALLSERIAL" => {
            INTEGER
        }
        "BIGINT" | "INT8" | "BIGSERIAL" | "SERIAL8" => BIGINT,
        "TEXT" | "VARCHAR" | "CHARACTER VARYING" | "CHAR" | "CHARACTER" | "BPCHAR" | "CITEXT"
        | "NAME" => TEXT,
        "BOOLEAN" | "BOOL" => BOOLEAN,
        "REAL" | "FLOAT4" | "FLOAT" | "FLOAT8" | "DOUBLE PRECISION" | "DOUBLE" | "NUMERIC"
        | "DECIMAL" => DECIMAL,
        "MONEY" => MONEY,
        "DATE" => DATE,
        "TIME" | "TIMETZ" | "TIME WITH TIME ZONE" | "TIME WITHOUT TIME ZONE" => TIME,
        "TIMESTAMP" | "TIMESTAMPTZ" | "TIMESTAMP WITH TIME ZONE" | "TIMESTAMP WITHOUT TIME ZONE" => {
            TIMESTAMP
        }
        "INTERVAL" => INTERVAL,
        "UUID" => UUID,
        "JSON" | "JSONB" => JSON,
        "BYTEA" => BINARY,
        "INET" | "CIDR" => IP_ADDRESS,
        _ => TEXT,
    };
    (ty, is_array)
}

/// Prisma scalar type to canonical type.
pub fn prisma_type(native: &str) -> CanonicalType {
    match native {
        "String" => TEXT,
        "Int" => INTEGER,
        "BigInt" => BIGINT,
        "Float" | "Decimal" => DECIMAL,
        "Boolean" => BOOLEAN,
        "DateTime" => TIMESTAMP,
        "Json" => JSON,
        "Bytes" => BINARY,
        _ => TEXT,
    }
}

/// Whether a Prisma type token is a built-in scalar.
pub fn is_prisma_scalar(native: &str) -> bool {
    matches!(
        native,
        "String" | "Int" | "BigInt" | "Float" | "Decimal" | "Boolean" | "DateTime" | "Json" | "Bytes"
    )
}

/// Rust type (std, chrono, uuid, serde_json) or Diesel SQL type to canonical type.
pub fn rust_type(native: &str) -> CanonicalType {
    let base = native.rsplit("::").next().unwrap_or(native).trim();
    match base {
        "String" | "str" | "&str" | "Text" | "Varchar" | "Char" | "Citext" => TEXT,
        "i8" | "i16" | "i32" | "u8" | "u16" | "u32" | "Integer" | "Int4" | "SmallInt" | "Int2" => {
            INTEGER
        }
        "i64" | "u64" | "i128" | "u128" | "isize" | "usize" | "BigInt" | "Int8" => BIGINT,
        "f32" | "f64" | "Float" | "Float4" | "Double" | "Float8" | "Numeric" | "BigDecimal"
        | "Decimal" => DECIMAL,
        "bool" | "Bool" => BOOLEAN,
        "Uuid" => UUID,
        "NaiveDateTime" | "DateTime" | "Timestamp" | "Timestamptz" | "SystemTime" => TIMESTAMP,
        "NaiveDate" | "Date" => DATE,
        "NaiveTime" | "Time" => TIME,
        "Value" | "Json" | "Jsonb" => JSON,
        "Bytea" | "Binary" | "Vec<u8>" => BINARY,
        "Interval" => INTERVAL,
        "Money" | "Cents" | "PgMoney" => MONEY,
        "IpNetwork" | "Inet" | "Cidr" | "IpAddr" => IP_ADDRESS,
        _ => TEXT,
    }
}

/// Java type to canonical type.
pub fn java_type(native: &str) -> CanonicalType {
    let base = native.rsplit('.').next().unwrap_or(native).trim();
    match base {
        "String" | "char" | "Character" | "CharSequence" => TEXT,
        "int" | "Integer" | "short" | "Short" | "byte" | "Byte" => INTEGER,
        "long" | "Long" | "BigInteger" => BIGINT,
        "double" | "Double" | "float" | "Float" | "BigDecimal" => DECIMAL,
        "boolean" | "Boolean" => BOOLEAN,
        "LocalDateTime" | "Instant" | "ZonedDateTime" | "OffsetDateTime" | "Timestamp" | "Date" => {
            TIMESTAMP
        }
        "LocalDate" => DATE,
        "LocalTime" | "OffsetTime" => TIME,
        "Duration" => INTERVAL,
        "UUID" => UUID,
        "byte[]" | "Byte[]" | "Blob" => BINARY,
        "JsonNode" | "Map" => JSON,
        _ => TEXT,
    }
}

/// Python annotation, Django field class, or SQLAlchemy column type to canonical type.
pub fn python_type(native: &str) -> CanonicalType {
    let base = native.rsplit('.').next().unwrap_or(native).trim();
    match base {
        "str" | "String" | "Text" | "Unicode" | "UnicodeText" | "CharField" | "TextField"
        | "SlugField" => TEXT,
        "int" | "Integer" | "SmallInteger" | "IntegerField" | "SmallIntegerField" | "AutoField"
        | "PositiveIntegerField" | "PositiveSmallIntegerField" => INTEGER,
        "BigInteger" | "BigIntegerField" | "BigAutoField" => BIGINT,
        "float" | "Float" | "Numeric" | "Decimal" | "FloatField" | "DecimalField" => DECIMAL,
        "bool" | "Boolean" | "BooleanField" | "NullBooleanField" => BOOLEAN,
        "datetime" | "DateTime" | "DateTimeField" => TIMESTAMP,
        "date" | "Date" | "DateField" => DATE,
        "time" | "Time" | "TimeField" => TIME,
        "timedelta" | "Interval" | "DurationField" => INTERVAL,
        "UUID" | "UUIDField" | "Uuid" => UUID,
        "dict" | "JSON" | "JSONB" | "JSONField" => JSON,
        "bytes" | "LargeBinary" | "BinaryField" => BINARY,
        "EmailField" => EMAIL,
        "URLField" => URL,
        "GenericIPAddressField" | "IPAddressField" | "INET" => IP_ADDRESS,
        _ => TEXT,
    }
}

/// TypeScript type to canonical type.
pub fn typescript_type(native: &str) -> CanonicalType {
    match native.trim() {
        "string" | "String" => TEXT,
        "number" | "Number" => DECIMAL,
        "bigint" | "BigInt" => BIGINT,
        "boolean" | "Boolean" => BOOLEAN,
        "Date" => TIMESTAMP,
        "object" | "any" | "unknown" | "Record" | "JSON" => JSON,
        "Buffer" | "Uint8Array" => BINARY,
        _ => TEXT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_aliases_and_modifiers() {
        assert_eq!(sql_type("int4"), (INTEGER, false));
        assert_eq!(sql_type("VARCHAR(255)"), (TEXT, false));
        assert_eq!(sql_type("timestamp with time zone"), (TIMESTAMP, false));
        assert_eq!(sql_type("numeric(10, 2)"), (DECIMAL, false));
        assert_eq!(sql_type("text[]"), (TEXT, true));
        assert_eq!(sql_type("uuid").0.tier, TypeTier::Scalar);
    }

    #[test]
    fn test_unknown_defaults_to_text() {
        assert_eq!(sql_type("GEOMETRY"), (TEXT, false));
        assert_eq!(prisma_type("Unsupported"), TEXT);
        assert_eq!(rust_type("MyNewtype"), TEXT);
        assert_eq!(java_type("Whatever"), TEXT);
        assert_eq!(python_type("ArrayField"), TEXT);
    }

    #[test]
    fn test_language_tables() {
        assert_eq!(prisma_type("DateTime"), TIMESTAMP);
        assert_eq!(rust_type("chrono::NaiveDateTime"), TIMESTAMP);
        assert_eq!(rust_type("uuid::Uuid"), UUID);
        assert_eq!(java_type("java.time.LocalDate"), DATE);
        assert_eq!(python_type("models.BigAutoField"), BIGINT);
        assert_eq!(typescript_type("boolean"), BOOLEAN);
    }

    #[test]
    fn test_rich_scalar_promotion() {
        assert_eq!(make_field("contact_email", "TEXT", TEXT).canonical_type, "email");
        assert_eq!(make_field("websiteUrl", "String", TEXT).canonical_type, "url");
        assert_eq!(make_field("phone", "text", TEXT).type_tier, TypeTier::Scalar);
        assert_eq!(make_field("emails_sent", "INTEGER", INTEGER).canonical_type, "integer");
        assert_eq!(make_field("title", "TEXT", TEXT).type_tier, TypeTier::Basic);
    }

    #[test]
    fn test_postgres_mapping() {
        assert_eq!(TIMESTAMP.postgres_type(), "TIMESTAMPTZ");
        assert_eq!(JSON.postgres_type(), "JSONB");
        assert_eq!(EMAIL.postgres_type(), "TEXT");
    }
}
