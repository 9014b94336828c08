use redis::Value;
use tracing::{debug, warn};

use crate::backend::Connection;
use crate::error::{BackendError, BackendResult};
use crate::recorder::RunSummary;
use crate::suite::{mismatch, or_nil};

pub const KEY: &str = "test:transaction";
pub const COUNTER: &str = "test:counter";
pub const KEYS: &[&str] = &[KEY, COUNTER];

pub async fn run<C: Connection>(conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
    let batch: [(&str, &[&str]); 4] = [
        ("SET", &[KEY, "before"]),
        ("GET", &[KEY]),
        ("INCRBY", &[COUNTER, "10"]),
        ("GET", &[COUNTER]),
    ];
    begin(conn, &batch).await?;
    let results: Vec<Value> = conn.query("EXEC", &[]).await?;
    let value: Option<String> = conn.query("GET", &[KEY]).await?;
    summary.record_covering(
        "MULTI/EXEC",
        &["multi", "exec"],
        results.len() == batch.len() && value.as_deref() == Some("before"),
        format!(
            "expected {} results and {KEY}=before, got {results:?} and {}",
            batch.len(),
            or_nil(&value)
        ),
    );

    let aborted: [(&str, &[&str]); 1] = [("SET", &[KEY, "discarded"])];
    begin(conn, &aborted).await?;
    conn.invoke("DISCARD", &[]).await?;
    let value: Option<String> = conn.query("GET", &[KEY]).await?;
    summary.record_covering(
        "DISCARD",
        &["discard"],
        value.as_deref() == Some("before"),
        mismatch("before", or_nil(&value)),
    );

    Ok(())
}

/// Open a MULTI block and queue `ops`. If queueing fails the block is
/// discarded before the error is returned.
async fn begin<C: Connection>(conn: &mut C, ops: &[(&str, &[&str])]) -> BackendResult<()> {
    conn.invoke("MULTI", &[]).await?;
    for (command, args) in ops {
        if let Err(e) = enqueue(conn, command, args).await {
            if let Err(discard) = conn.invoke("DISCARD", &[]).await {
                warn!(error = %discard, "discard after failed enqueue");
            }
            return Err(e);
        }
    }
    Ok(())
}

async fn enqueue<C: Connection>(conn: &mut C, command: &str, args: &[&str]) -> BackendResult<()> {
    let reply: String = conn.query(command, args).await?;
    if reply == "QUEUED" {
        Ok(())
    } else {
        Err(BackendError::unexpected(command, format!("expected QUEUED, got {reply}")))
    }
}

/// Make sure the connection is not left inside a MULTI block. DISCARD is
/// tried first; if the server refuses it, EXEC closes the block instead.
/// Both fail harmlessly when no block is open.
pub(crate) async fn leave_multi<C: Connection>(conn: &mut C) {
    let Err(discard) = conn.invoke("DISCARD", &[]).await else {
        return;
    };
    debug!(error = %discard, "discard during cleanup");
    if let Err(exec) = conn.invoke("EXEC", &[]).await {
        debug!(error = %exec, "exec during cleanup");
    }
}
