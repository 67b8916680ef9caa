use thiserror::Error;

/// Errors produced while resolving or dispatching a query.
///
/// `Validation` and `ArgumentParse` are raised before the database file is
/// touched; everything else comes out of engine contact.
#[derive(Debug, Error)]
pub enum SqliteNodeError {
    /// Input rejected before the database is opened.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The `arguments` parameter was not valid JSON.
    #[error("Argument parse error: {0}")]
    ArgumentParse(#[from] serde_json::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("SQL execution error: {0}")]
    Execution(String),
}

impl SqliteNodeError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

/// A node failure annotated with the input item it originated from.
///
/// Surfaced when the item loop aborts; in continue-on-fail mode the same
/// information is attached to a synthesized output item instead.
#[derive(Debug, Error)]
#[error("item {item_index}: {source}")]
pub struct NodeRunError {
    /// Index of the failing input item.
    pub item_index: usize,
    #[source]
    pub source: SqliteNodeError,
}
