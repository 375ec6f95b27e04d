//! Identifier and literal quoting.
//!
//! Pure string transforms shared by the compiler, the metadata query
//! builder and the interpolation pass. None of them can fail.

// =============================================================================
// Identifiers
// =============================================================================

/// Quote an identifier with double quotes, doubling embedded quotes.
///
/// This is the only identifier quoting the generated SQL uses.
pub fn quote_identifier(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Remove identifier quoting so the bare name can be compared in metadata queries.
///
/// Only strips the quotes when both the first and the last character are `"`;
/// unquoted input is returned unchanged. A lone `"` unquotes to nothing.
pub fn unquote_identifier(ident: &str) -> String {
    match ident.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None if ident == "\"" => String::new(),
        None => ident.to_string(),
    }
}

// =============================================================================
// Literals
// =============================================================================

/// Quote a string literal with single quotes (standard SQL).
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}

/// Double embedded single quotes without adding the surrounding quotes.
///
/// Used when the surrounding quotes come from the text the value is
/// substituted into.
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}

/// Turn a (possibly quoted) identifier into a string literal holding its bare name.
pub fn quote_ident_as_literal(ident: &str) -> String {
    quote_literal(&unquote_identifier(ident))
}
