use crate::backend::Connection;
use crate::error::BackendResult;
use crate::recorder::RunSummary;
use crate::suite::{mismatch, or_nil};

pub const KEY: &str = "test:string";
pub const COUNTER: &str = "test:counter";
pub const KEYS: &[&str] = &[KEY, COUNTER];

const GREETING: &str = "Hello Redis";
const SUFFIX: &str = "! Testing...";

pub async fn run<C: Connection>(conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
    conn.invoke("SET", &[KEY, GREETING]).await?;
    let value: Option<String> = conn.query("GET", &[KEY]).await?;
    summary.record_covering(
        "SET/GET",
        &["set", "get"],
        value.as_deref() == Some(GREETING),
        mismatch(GREETING, or_nil(&value)),
    );

    let appended = format!("{GREETING}{SUFFIX}");
    conn.invoke("APPEND", &[KEY, SUFFIX]).await?;
    let value: Option<String> = conn.query("GET", &[KEY]).await?;
    summary.record_covering(
        "APPEND",
        &["append"],
        value.as_deref() == Some(appended.as_str()),
        mismatch(&appended, or_nil(&value)),
    );

    conn.invoke("SET", &[COUNTER, "100"]).await?;
    let reply: i64 = conn.query("INCR", &[COUNTER]).await?;
    let value: Option<String> = conn.query("GET", &[COUNTER]).await?;
    summary.record_covering(
        "INCR",
        &["incr"],
        reply == 101 && value.as_deref() == Some("101"),
        format!("{} (reply {reply})", mismatch("101", or_nil(&value))),
    );

    let reply: i64 = conn.query("DECR", &[COUNTER]).await?;
    let value: Option<String> = conn.query("GET", &[COUNTER]).await?;
    summary.record_covering(
        "DECR",
        &["decr"],
        reply == 100 && value.as_deref() == Some("100"),
        format!("{} (reply {reply})", mismatch("100", or_nil(&value))),
    );

    let length: usize = conn.query("STRLEN", &[KEY]).await?;
    summary.record_covering(
        "STRLEN",
        &["strlen"],
        length == appended.len(),
        mismatch(appended.len(), length),
    );

    Ok(())
}
