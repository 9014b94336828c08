use redis::Value;

use crate::backend::Connection;
use crate::error::BackendResult;
use crate::recorder::RunSummary;

pub const CHANNEL: &str = "test:channel";

/// Only the publish reply is checked; delivery is not.
pub async fn run<C: Connection>(conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
    let subscribed = conn.subscribe(CHANNEL).await;
    summary.record_covering(
        "SUBSCRIBE",
        &["subscribe"],
        subscribed.is_ok(),
        match &subscribed {
            Ok(()) => format!("listening on {CHANNEL}"),
            Err(e) => e.to_string(),
        },
    );

    let reply = conn.invoke("PUBLISH", &[CHANNEL, "Hello PubSub"]).await?;
    let (ok, message) = match reply {
        Value::Int(n) if n >= 0 => (true, format!("subscribers: {n}")),
        other => (false, format!("publish should return a subscriber count, got {other:?}")),
    };
    summary.record_covering("PUBLISH", &["publish"], ok, message);

    Ok(())
}
