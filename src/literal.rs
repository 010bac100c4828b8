//! Literal token parsing, shared between field initializers (C3) and
//! expression literals (C7).

use crate::value::Value;

/// Parses a leaf's surface text as a literal, per spec §4.1: decimal ints,
/// `true`/`false`, double-quoted strings, `null`. Returns `None` if the text
/// is none of these (the caller decides whether that's a variable reference
/// or a syntax error).
#[must_use]
pub fn parse_literal_token(text: &str) -> Option<Value> {
    match text {
        "null" => Some(Value::Null),
        "true" => Some(Value::Bool(true)),
        "false" => Some(Value::Bool(false)),
        _ if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') => {
            Some(Value::Str(text[1..text.len() - 1].to_owned()))
        }
        _ => text.parse::<i64>().ok().map(Value::Int),
    }
}
