//! Convenient imports for common functionality.

pub use crate::connection::SqliteConnection;
pub use crate::dispatcher::{STATUS_MESSAGE, execute};
pub use crate::error::{NodeRunError, SqliteNodeError};
pub use crate::node::{Item, NodeParameters, run, spread_payload};
pub use crate::statement::{
    ResolvedStatement, filter_arguments, resolve_kind, resolve_statements,
};
pub use crate::types::{
    ExecutionResult, Invocation, MutationSummary, QueryKind, QueryOutcome, Record,
};
