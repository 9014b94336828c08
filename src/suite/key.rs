use crate::backend::Connection;
use crate::error::BackendResult;
use crate::pattern;
use crate::recorder::RunSummary;
use crate::suite::{NAMESPACE, mismatch};

pub const KEY1: &str = "test:key1";
pub const KEY2: &str = "test:key2";
pub const KEYS: &[&str] = &[KEY1, KEY2];

const ABSENT: &str = "test:absent";
const TTL_SECS: i64 = 5;

pub async fn run<C: Connection>(conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
    conn.invoke("DEL", &[KEY1, KEY2]).await?;
    conn.invoke("SET", &[KEY1, "value1"]).await?;
    conn.invoke("SET", &[KEY2, "value2"]).await?;

    let expected = pattern::select(NAMESPACE, [KEY1, KEY2]);
    let mut listed: Vec<String> = conn.query("KEYS", &[NAMESPACE]).await?;
    listed.sort();
    summary.record_covering(
        "KEYS",
        &["keys"],
        listed == expected,
        mismatch(format!("{expected:?}"), format!("{listed:?}")),
    );

    let exists: bool = conn.query("EXISTS", &[KEY1]).await?;
    let missing: bool = conn.query("EXISTS", &[ABSENT]).await?;
    summary.record_covering(
        "EXISTS",
        &["exists"],
        exists && !missing,
        format!("{KEY1} should exist ({exists}), {ABSENT} should not ({missing})"),
    );

    let ttl_arg = TTL_SECS.to_string();
    conn.invoke("EXPIRE", &[KEY1, ttl_arg.as_str()]).await?;
    let ttl: i64 = conn.query("TTL", &[KEY1]).await?;
    summary.record_covering(
        "EXPIRE/TTL",
        &["expire", "ttl"],
        ttl > 0 && ttl <= TTL_SECS,
        format!("ttl should be in 1..={TTL_SECS}, actual: {ttl}"),
    );

    conn.invoke("DEL", &[KEY2]).await?;
    let exists: bool = conn.query("EXISTS", &[KEY2]).await?;
    summary.record_covering("DEL", &["del"], !exists, format!("{KEY2} should be gone"));

    Ok(())
}
