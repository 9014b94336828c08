use std::collections::BTreeMap;

use crate::backend::Connection;
use crate::error::BackendResult;
use crate::recorder::RunSummary;
use crate::suite::{mismatch, or_nil};

pub const KEY: &str = "test:hash";
pub const KEYS: &[&str] = &[KEY];

const FIELDS: [(&str, &str); 2] = [("name", "Redis"), ("version", "7.0")];

pub async fn run<C: Connection>(conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
    let mut expected = BTreeMap::new();
    for (field, value) in FIELDS {
        conn.invoke("HSET", &[KEY, field, value]).await?;
        expected.insert(field.to_string(), value.to_string());
    }

    let name: Option<String> = conn.query("HGET", &[KEY, "name"]).await?;
    summary.record_covering(
        "HSET/HGET",
        &["hset", "hget"],
        name.as_deref() == Some("Redis"),
        mismatch("Redis", or_nil(&name)),
    );

    let all: BTreeMap<String, String> = conn.query("HGETALL", &[KEY]).await?;
    summary.record_covering(
        "HGETALL",
        &["hgetall"],
        all == expected,
        mismatch(format!("{expected:?}"), format!("{all:?}")),
    );

    // field order is unspecified, compare sorted
    let mut fields: Vec<String> = conn.query("HKEYS", &[KEY]).await?;
    fields.sort();
    let want_fields: Vec<String> = expected.keys().cloned().collect();
    summary.record_covering(
        "HKEYS",
        &["hkeys"],
        fields == want_fields,
        mismatch(format!("{want_fields:?}"), format!("{fields:?}")),
    );

    let mut values: Vec<String> = conn.query("HVALS", &[KEY]).await?;
    values.sort();
    let mut want_values: Vec<String> = expected.values().cloned().collect();
    want_values.sort();
    summary.record_covering(
        "HVALS",
        &["hvals"],
        values == want_values,
        mismatch(format!("{want_values:?}"), format!("{values:?}")),
    );

    conn.invoke("HDEL", &[KEY, "version"]).await?;
    expected.remove("version");
    let all: BTreeMap<String, String> = conn.query("HGETALL", &[KEY]).await?;
    summary.record_covering(
        "HDEL",
        &["hdel"],
        all == expected,
        mismatch(format!("{expected:?}"), format!("{all:?}")),
    );

    Ok(())
}
