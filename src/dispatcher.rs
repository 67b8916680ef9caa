use futures_util::future::try_join_all;
use tracing::debug;

use crate::connection::SqliteConnection;
use crate::error::SqliteNodeError;
use crate::params::NamedParams;
use crate::statement::{ResolvedStatement, resolve_kind, resolve_statements};
use crate::types::{ExecutionResult, Invocation, QueryKind, QueryOutcome};

/// Acknowledgement reported by the generic execution path.
pub const STATUS_MESSAGE: &str = "Query executed successfully.";

/// Run one invocation end to end.
///
/// Validates the invocation, opens a fresh database handle, resolves the
/// statement kind and batch shape, executes, and closes the handle. A
/// multi-segment SELECT fans out across the shared handle and joins in
/// segment order; the first failing segment fails the whole invocation with
/// no partial results.
///
/// # Errors
///
/// `SqliteNodeError::Validation` for an empty database path or query text,
/// raised before the database is touched; otherwise whatever the engine
/// reports while opening the file or executing the statement.
pub async fn execute(invocation: &Invocation) -> Result<QueryOutcome, SqliteNodeError> {
    if invocation.database_path.is_empty() {
        return Err(SqliteNodeError::validation("database path must not be empty"));
    }
    if invocation.query_text.is_empty() {
        return Err(SqliteNodeError::validation("query text must not be empty"));
    }

    let kind = resolve_kind(invocation.query_type, &invocation.query_text);
    let statements = resolve_statements(kind, &invocation.query_text, &invocation.arguments);
    debug!(?kind, segments = statements.len(), "dispatching query");

    let connection = SqliteConnection::open(&invocation.database_path).await?;
    let outcome = run_statements(&connection, kind, statements).await;
    drop(connection);
    outcome
}

async fn run_statements(
    connection: &SqliteConnection,
    kind: QueryKind,
    statements: Vec<ResolvedStatement>,
) -> Result<QueryOutcome, SqliteNodeError> {
    // Only SELECT invocations resolve to more than one statement.
    if statements.len() > 1 {
        let segments = statements.into_iter().map(|statement| {
            let connection = connection.clone();
            async move {
                let params = NamedParams::convert(&statement.bound_arguments);
                connection
                    .execute_select(statement.text, params)
                    .await
                    .map(ExecutionResult::Rows)
            }
        });
        let results = try_join_all(segments).await?;
        return Ok(QueryOutcome::Batch(results));
    }

    let statement = statements.into_iter().next().ok_or_else(|| {
        SqliteNodeError::Execution("no executable statement resolved".into())
    })?;
    let params = NamedParams::convert(&statement.bound_arguments);

    let result = match kind {
        QueryKind::Select => ExecutionResult::Rows(
            connection.execute_select(statement.text, params).await?,
        ),
        QueryKind::Insert | QueryKind::Update | QueryKind::Delete => ExecutionResult::Mutation(
            connection.execute_mutation(statement.text, params).await?,
        ),
        QueryKind::Create | QueryKind::Auto => {
            connection.execute_generic(statement.text, params).await?;
            ExecutionResult::Status {
                message: STATUS_MESSAGE.to_string(),
            }
        }
    };
    Ok(QueryOutcome::Single(result))
}
