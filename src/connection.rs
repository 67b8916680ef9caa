use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use rusqlite::Connection;
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::SqliteNodeError;
use crate::params::NamedParams;
use crate::results::build_records;
use crate::types::{MutationSummary, Record};

/// Handle to a `SQLite` database owned by a dedicated worker thread.
///
/// One handle is opened per invocation and the underlying file connection
/// closes when the handle (and any clones) drop. Clones share the worker,
/// so batch segments can be dispatched concurrently while the worker
/// serializes the actual engine calls.
#[derive(Clone)]
pub struct SqliteConnection {
    worker: Arc<SqliteWorker>,
}

impl SqliteConnection {
    /// Open the database file and spawn its worker thread.
    ///
    /// # Errors
    ///
    /// Returns `SqliteNodeError::Connection` if the worker thread cannot be
    /// spawned, or the engine's own error if the file cannot be opened.
    pub async fn open(database_path: &str) -> Result<Self, SqliteNodeError> {
        let worker = SqliteWorker::spawn(database_path.to_owned()).await?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    /// Execute a SELECT and return its rows in engine order.
    ///
    /// # Errors
    ///
    /// Returns any `SqliteNodeError` the worker reports while preparing or
    /// stepping the statement, or if the worker channel closes.
    pub async fn execute_select(
        &self,
        query: String,
        params: NamedParams,
    ) -> Result<Vec<Record>, SqliteNodeError> {
        self.worker.execute_select(query, params).await
    }

    /// Execute a mutation (INSERT/UPDATE/DELETE) and return its summary.
    ///
    /// # Errors
    ///
    /// Returns any `SqliteNodeError` the worker reports while executing the
    /// statement, or if the worker channel closes.
    pub async fn execute_mutation(
        &self,
        query: String,
        params: NamedParams,
    ) -> Result<MutationSummary, SqliteNodeError> {
        self.worker.execute_mutation(query, params).await
    }

    /// Execute any other statement, discarding row counts.
    ///
    /// # Errors
    ///
    /// Returns any `SqliteNodeError` the worker reports while executing the
    /// statement, or if the worker channel closes.
    pub async fn execute_generic(
        &self,
        query: String,
        params: NamedParams,
    ) -> Result<(), SqliteNodeError> {
        self.worker.execute_generic(query, params).await
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection").finish_non_exhaustive()
    }
}

struct SqliteWorker {
    sender: Sender<Command>,
}

impl SqliteWorker {
    async fn spawn(database_path: String) -> Result<Self, SqliteNodeError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), SqliteNodeError>>();
        thread::Builder::new()
            .name("sqlite-node-worker".into())
            .spawn(move || run_worker(&database_path, &receiver, ready_tx))
            .map_err(|err| {
                SqliteNodeError::Connection(format!(
                    "failed to spawn SQLite worker thread: {err}"
                ))
            })?;

        ready_rx.await.map_err(|_| {
            SqliteNodeError::Connection(
                "SQLite worker exited before opening the database".into(),
            )
        })??;

        Ok(Self { sender })
    }

    fn send_command(&self, command: Command) -> Result<(), SqliteNodeError> {
        self.sender
            .send(command)
            .map_err(|_| SqliteNodeError::Connection("SQLite worker closed".into()))
    }

    async fn execute_select(
        &self,
        query: String,
        params: NamedParams,
    ) -> Result<Vec<Record>, SqliteNodeError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::Select {
            query,
            params,
            respond_to: tx,
        })?;
        rx.await.map_err(|_| {
            SqliteNodeError::Connection("SQLite worker dropped while executing select".into())
        })?
    }

    async fn execute_mutation(
        &self,
        query: String,
        params: NamedParams,
    ) -> Result<MutationSummary, SqliteNodeError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::Mutate {
            query,
            params,
            respond_to: tx,
        })?;
        rx.await.map_err(|_| {
            SqliteNodeError::Connection("SQLite worker dropped while executing mutation".into())
        })?
    }

    async fn execute_generic(
        &self,
        query: String,
        params: NamedParams,
    ) -> Result<(), SqliteNodeError> {
        let (tx, rx) = oneshot::channel();
        self.send_command(Command::Generic {
            query,
            params,
            respond_to: tx,
        })?;
        rx.await.map_err(|_| {
            SqliteNodeError::Connection("SQLite worker dropped while executing statement".into())
        })?
    }
}

impl Drop for SqliteWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

enum Command {
    Select {
        query: String,
        params: NamedParams,
        respond_to: oneshot::Sender<Result<Vec<Record>, SqliteNodeError>>,
    },
    Mutate {
        query: String,
        params: NamedParams,
        respond_to: oneshot::Sender<Result<MutationSummary, SqliteNodeError>>,
    },
    Generic {
        query: String,
        params: NamedParams,
        respond_to: oneshot::Sender<Result<(), SqliteNodeError>>,
    },
    Shutdown,
}

fn run_worker(
    database_path: &str,
    receiver: &Receiver<Command>,
    ready: oneshot::Sender<Result<(), SqliteNodeError>>,
) {
    let conn = match Connection::open(database_path) {
        Ok(conn) => {
            debug!(path = database_path, "opened sqlite database");
            if ready.send(Ok(())).is_err() {
                return;
            }
            conn
        }
        Err(err) => {
            let _ = ready.send(Err(err.into()));
            return;
        }
    };

    while let Ok(command) = receiver.recv() {
        match command {
            Command::Select {
                query,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(run_select(&conn, &query, &params));
            }
            Command::Mutate {
                query,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(run_mutation(&conn, &query, &params));
            }
            Command::Generic {
                query,
                params,
                respond_to,
            } => {
                let _ = respond_to.send(run_generic(&conn, &query, &params));
            }
            Command::Shutdown => break,
        }
    }

    debug!(path = database_path, "closing sqlite database");
}

fn run_select(
    conn: &Connection,
    query: &str,
    params: &NamedParams,
) -> Result<Vec<Record>, SqliteNodeError> {
    let mut stmt = conn.prepare(query)?;
    build_records(&mut stmt, params)
}

fn run_mutation(
    conn: &Connection,
    query: &str,
    params: &NamedParams,
) -> Result<MutationSummary, SqliteNodeError> {
    let mut stmt = conn.prepare(query)?;
    let param_refs = params.as_refs();
    let changed_count = stmt.execute(&param_refs[..])?;
    // Fresh handle per invocation, so a rowid of 0 means no insert ran on it.
    let rowid = conn.last_insert_rowid();
    Ok(MutationSummary {
        changed_count,
        last_inserted_id: (rowid != 0).then_some(rowid),
    })
}

fn run_generic(
    conn: &Connection,
    query: &str,
    params: &NamedParams,
) -> Result<(), SqliteNodeError> {
    let mut stmt = conn.prepare(query)?;
    let param_refs = params.as_refs();
    stmt.execute(&param_refs[..])?;
    Ok(())
}
