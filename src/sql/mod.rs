//! SQL text helpers.
//!
//! - [`quote`] - identifier and literal quoting

pub mod quote;

#[cfg(test)]
pub mod test_utils;

pub use quote::{
    escape_literal, quote_ident_as_literal, quote_identifier, quote_literal, unquote_identifier,
};
