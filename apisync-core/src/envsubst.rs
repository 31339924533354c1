//! Environment-variable substitution applied to parameter files before parsing.
//!
//! `${NAME}` and `$NAME` are replaced, where `NAME` is one or more word
//! characters. `$$` produces a literal `$`. A `$` that starts neither form is
//! copied unchanged.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static VAR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$(?:(\$)|\{(\w+)\}|(\w+))").expect("variable reference pattern is valid")
});

/// Substitute variables in `text`, resolving names through `lookup`.
///
/// A variable that resolves to an empty string counts as missing. On failure
/// every missing name is returned once, in order of first appearance.
pub fn substitute_with<F>(text: &str, mut lookup: F) -> Result<String, Vec<String>>
where
    F: FnMut(&str) -> Option<String>,
{
    let mut missing: Vec<String> = Vec::new();
    let out = VAR_REF.replace_all(text, |caps: &Captures<'_>| {
        if caps.get(1).is_some() {
            return "$".to_string();
        }
        let Some(name) = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str()) else {
            return caps[0].to_string();
        };
        match lookup(name) {
            Some(value) if !value.is_empty() => value,
            _ => {
                if !missing.iter().any(|m| m == name) {
                    missing.push(name.to_string());
                }
                String::new()
            }
        }
    });
    if missing.is_empty() {
        Ok(out.into_owned())
    } else {
        Err(missing)
    }
}
