//! Workflow node that runs parameterized SQL against a local `SQLite`
//! database file and maps the results back onto the item stream.
//!
//! Each input item yields one invocation: a database path, an optional
//! query-kind hint, the SQL text, a JSON object of named arguments, and a
//! spread flag. The dispatcher resolves the effective statement kind,
//! filters the arguments down to those the text references, opens a fresh
//! handle, executes (fanning out `;`-separated SELECT batches), and shapes
//! the result into rows, a mutation summary, or a status message.

pub mod connection;
pub mod dispatcher;
pub mod error;
pub mod node;
pub mod params;
pub mod prelude;
pub mod results;
pub mod statement;
pub mod types;

pub use dispatcher::execute;
pub use error::{NodeRunError, SqliteNodeError};
pub use types::{
    ExecutionResult, Invocation, MutationSummary, QueryKind, QueryOutcome, Record,
};
