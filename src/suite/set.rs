use crate::backend::Connection;
use crate::error::BackendResult;
use crate::recorder::RunSummary;
use crate::suite::mismatch;

pub const KEY: &str = "test:set";
pub const KEYS: &[&str] = &[KEY];

const MEMBERS: [&str; 3] = ["member1", "member2", "member3"];

pub async fn run<C: Connection>(conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
    conn.invoke("SADD", &[KEY, MEMBERS[0], MEMBERS[1], MEMBERS[2]]).await?;
    let mut members: Vec<String> = conn.query("SMEMBERS", &[KEY]).await?;
    members.sort();
    summary.record_covering(
        "SADD/SMEMBERS",
        &["sadd", "smembers"],
        members == MEMBERS,
        mismatch(format!("{MEMBERS:?}"), format!("{members:?}")),
    );

    let added: i64 = conn.query("SADD", &[KEY, MEMBERS[0]]).await?;
    let count: usize = conn.query("SCARD", &[KEY]).await?;
    summary.record_covering(
        "SADD (re-add)",
        &["sadd"],
        added == 0 && count == MEMBERS.len(),
        format!("re-adding an existing member returned {added}, cardinality {count}"),
    );

    let present: bool = conn.query("SISMEMBER", &[KEY, "member2"]).await?;
    let absent: bool = conn.query("SISMEMBER", &[KEY, "member4"]).await?;
    summary.record_covering(
        "SISMEMBER",
        &["sismember"],
        present && !absent,
        format!("member2 should be present ({present}), member4 absent ({absent})"),
    );

    let count: usize = conn.query("SCARD", &[KEY]).await?;
    summary.record_covering("SCARD", &["scard"], count == MEMBERS.len(), mismatch(MEMBERS.len(), count));

    let removed: usize = conn.query("SREM", &[KEY, "member2"]).await?;
    let after: usize = conn.query("SCARD", &[KEY]).await?;
    summary.record_covering(
        "SREM",
        &["srem"],
        removed == 1 && after == count.saturating_sub(removed),
        mismatch(count.saturating_sub(1), after),
    );

    Ok(())
}
