//! Pure string logic for statement resolution.
//!
//! Kind detection and argument filtering are substring-based on purpose:
//! which arguments get bound and which kind is inferred are observable
//! behavior, so no tokenizer or SQL parser is substituted here.

use serde_json::{Map, Value as JsonValue};

use crate::types::QueryKind;

/// One executable statement with the arguments that survived filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStatement {
    /// The statement text sent to the engine.
    pub text: String,
    /// The effective kind shared by all segments of the invocation.
    pub kind: QueryKind,
    /// Arguments whose key occurs in `text`.
    pub bound_arguments: Map<String, JsonValue>,
}

/// Keyword probes for `Auto` resolution, in tie-break priority order.
const KEYWORD_PRIORITY: [(&str, QueryKind); 5] = [
    ("SELECT", QueryKind::Select),
    ("INSERT", QueryKind::Insert),
    ("UPDATE", QueryKind::Update),
    ("DELETE", QueryKind::Delete),
    ("CREATE", QueryKind::Create),
];

/// Resolve the effective statement kind.
///
/// A non-`Auto` hint is taken as-is. In `Auto` mode the trimmed text is
/// uppercased and probed for keyword substrings in fixed priority order;
/// the first hit wins, so a text containing both SELECT and INSERT resolves
/// to SELECT regardless of position. No hit leaves the kind at `Auto`,
/// which executes on the generic path.
#[must_use]
pub fn resolve_kind(hint: QueryKind, query_text: &str) -> QueryKind {
    if hint != QueryKind::Auto {
        return hint;
    }
    let upper = query_text.trim().to_uppercase();
    for (keyword, kind) in KEYWORD_PRIORITY {
        if upper.contains(keyword) {
            return kind;
        }
    }
    QueryKind::Auto
}

/// Keep only the arguments whose key occurs as a literal substring of the
/// statement text.
///
/// Passing a named parameter the statement never declares makes the engine
/// reject the call, so unreferenced keys are dropped up front. The check is
/// not a parse: a key matching only inside a string literal is still kept,
/// and the engine's rejection of it then propagates.
#[must_use]
pub fn filter_arguments(
    text: &str,
    arguments: &Map<String, JsonValue>,
) -> Map<String, JsonValue> {
    arguments
        .iter()
        .filter(|(key, _)| text.contains(key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Split a SELECT batch on `;`, dropping whitespace-only segments.
#[must_use]
pub fn split_select_batch(text: &str) -> Vec<&str> {
    text.split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Derive the resolved statements for an invocation.
///
/// A SELECT whose text splits into more than one non-empty segment yields
/// one statement per segment, each with its own independently filtered
/// arguments. Everything else (including a single-segment SELECT) is one
/// statement covering the whole text.
#[must_use]
pub fn resolve_statements(
    kind: QueryKind,
    query_text: &str,
    arguments: &Map<String, JsonValue>,
) -> Vec<ResolvedStatement> {
    if kind == QueryKind::Select {
        let segments = split_select_batch(query_text);
        if segments.len() > 1 {
            return segments
                .into_iter()
                .map(|segment| ResolvedStatement {
                    text: segment.to_string(),
                    kind,
                    bound_arguments: filter_arguments(segment, arguments),
                })
                .collect();
        }
    }
    vec![ResolvedStatement {
        text: query_text.to_string(),
        kind,
        bound_arguments: filter_arguments(query_text, arguments),
    }]
}
