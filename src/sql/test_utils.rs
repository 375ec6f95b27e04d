//! Test utilities for SQL emission validation.
//!
//! Generated statements are parsed with sqlparser-rs as a syntax check.
//! Only usable on SQL whose macros have already been expanded (or that
//! contains none), since `$__name(...)` is not SQL.

use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// Validates that a SQL string parses as PostgreSQL-flavoured SQL.
pub fn validate_sql(sql: &str) -> Result<(), String> {
    Parser::parse_sql(&PostgreSqlDialect {}, sql)
        .map(|_| ())
        .map_err(|e| format!("Invalid SQL: {}\nSQL: {}", e, sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_valid_sql() {
        validate_sql("SELECT started AS \"time\", value FROM public.intest ORDER BY 1").unwrap();
    }

    #[test]
    fn test_validate_invalid_sql() {
        let result = validate_sql("SELEC * FORM users");
        assert!(result.is_err());
    }
}
