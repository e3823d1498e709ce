//! Placeholder scanner.
//!
//! Splits a template string into literal text and `${expression}` tokens.
//! Nested braces are not supported: in `${a${b}}` only `${b}` is a token.

use regex_lite::Regex;
use std::sync::OnceLock;

/// One piece of a scanned template
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    Placeholder {
        /// Trimmed expression between the braces
        expression: &'a str,
        /// Full token text including `${` and `}`
        raw: &'a str,
    },
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\$\{([^${}]+)\}").expect("placeholder pattern is valid")
    })
}

/// Whether `input` contains at least one placeholder token
pub fn has_placeholders(input: &str) -> bool {
    placeholder_regex().is_match(input)
}

/// Split `input` into literal and placeholder segments, in order.
///
/// Tokens whose expression is blank (`${ }`) stay literal.
pub fn parse_template(input: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut last = 0;

    for caps in placeholder_regex().captures_iter(input) {
        let (Some(whole), Some(expr)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let expression = expr.as_str().trim();
        if expression.is_empty() {
            continue;
        }
        if whole.start() > last {
            segments.push(Segment::Literal(&input[last..whole.start()]));
        }
        segments.push(Segment::Placeholder {
            expression,
            raw: whole.as_str(),
        });
        last = whole.end();
    }

    if last < input.len() {
        segments.push(Segment::Literal(&input[last..]));
    }

    segments
}

/// Expressions referenced by `input`, in order of appearance
pub fn referenced_keys(input: &str) -> Vec<&str> {
    parse_template(input)
        .into_iter()
        .filter_map(|s| match s {
            Segment::Placeholder { expression, .. } => Some(expression),
            Segment::Literal(_) => None,
        })
        .collect()
}
