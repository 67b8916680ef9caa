use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// The statement category driving which execution primitive and result
/// shape apply.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum QueryKind {
    /// Infer the kind from the query text.
    #[default]
    Auto,
    Create,
    Delete,
    Insert,
    Select,
    Update,
}

/// One request to run a query, built from one input item.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Path to the database file.
    pub database_path: String,
    /// Kind hint; `Auto` defers to text-based resolution.
    pub query_type: QueryKind,
    /// The SQL text, possibly several `;`-separated SELECT statements.
    pub query_text: String,
    /// Named arguments, keys carrying their parameter prefix (`$x`, `:x`).
    pub arguments: Map<String, JsonValue>,
    /// Flatten per-statement SELECT results into the output list.
    pub spread: bool,
}

impl Invocation {
    /// Create a new invocation.
    #[must_use]
    pub fn new(
        database_path: impl Into<String>,
        query_type: QueryKind,
        query_text: impl Into<String>,
        arguments: Map<String, JsonValue>,
        spread: bool,
    ) -> Self {
        Self {
            database_path: database_path.into(),
            query_type,
            query_text: query_text.into(),
            arguments,
            spread,
        }
    }
}

/// A single result row keyed by column name.
pub type Record = Map<String, JsonValue>;

/// Affected-row summary reported by a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationSummary {
    /// Number of rows changed by the statement.
    pub changed_count: usize,
    /// Rowid of the last insert on this handle, if one happened.
    pub last_inserted_id: Option<i64>,
}

/// Outcome of running one resolved statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Ordered rows from a SELECT.
    Rows(Vec<Record>),
    /// Summary from an INSERT/UPDATE/DELETE.
    Mutation(MutationSummary),
    /// Acknowledgement from the generic path (CREATE and friends).
    Status {
        /// Fixed acknowledgement text.
        message: String,
    },
}

impl ExecutionResult {
    /// Convert the result into the JSON payload handed to the harness.
    #[must_use]
    pub fn into_json(self) -> JsonValue {
        match self {
            Self::Rows(rows) => {
                JsonValue::Array(rows.into_iter().map(JsonValue::Object).collect())
            }
            Self::Mutation(summary) => serde_json::json!({
                "changed_count": summary.changed_count,
                "last_inserted_id": summary.last_inserted_id,
            }),
            Self::Status { message } => serde_json::json!({ "message": message }),
        }
    }
}

/// What one invocation produced: a single result, or one result per segment
/// for a batched SELECT.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Single(ExecutionResult),
    Batch(Vec<ExecutionResult>),
}

impl QueryOutcome {
    /// Per-statement results in segment order.
    #[must_use]
    pub fn into_results(self) -> Vec<ExecutionResult> {
        match self {
            Self::Single(result) => vec![result],
            Self::Batch(results) => results,
        }
    }

    /// Convert the outcome into the JSON payload handed to the harness.
    ///
    /// A batch becomes an array of per-segment payloads; a single result is
    /// its payload directly (a flat row array for a SELECT, never a
    /// singleton wrapped in another array).
    #[must_use]
    pub fn into_json(self) -> JsonValue {
        match self {
            Self::Single(result) => result.into_json(),
            Self::Batch(results) => {
                JsonValue::Array(results.into_iter().map(ExecutionResult::into_json).collect())
            }
        }
    }
}
