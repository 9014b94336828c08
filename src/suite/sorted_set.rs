use crate::backend::Connection;
use crate::error::BackendResult;
use crate::recorder::RunSummary;
use crate::suite::mismatch;

pub const KEY: &str = "test:zset";
pub const KEYS: &[&str] = &[KEY];

const SCORED: [(&str, f64); 3] = [("member1", 10.0), ("member2", 5.0), ("member3", 15.0)];

pub async fn run<C: Connection>(conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
    let scores: Vec<String> = SCORED.iter().map(|(_, score)| score.to_string()).collect();
    let mut args = vec![KEY];
    for ((member, _), score) in SCORED.iter().zip(&scores) {
        args.push(score.as_str());
        args.push(*member);
    }
    conn.invoke("ZADD", &args).await?;

    let mut expected: Vec<(String, f64)> =
        SCORED.iter().map(|(member, score)| (member.to_string(), *score)).collect();
    expected.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let ranged: Vec<(String, f64)> = conn.query("ZRANGE", &[KEY, "0", "-1", "WITHSCORES"]).await?;
    let ascending = ranged.windows(2).all(|pair| pair[0].1 <= pair[1].1);
    summary.record_covering(
        "ZADD/ZRANGE",
        &["zadd", "zrange"],
        ranged == expected && ascending,
        mismatch(format!("{expected:?}"), format!("{ranged:?}")),
    );

    let score: Option<f64> = conn.query("ZSCORE", &[KEY, "member1"]).await?;
    summary.record_covering(
        "ZSCORE",
        &["zscore"],
        score == Some(10.0),
        mismatch("10", format!("{score:?}")),
    );

    let count: usize = conn.query("ZCARD", &[KEY]).await?;
    summary.record_covering("ZCARD", &["zcard"], count == SCORED.len(), mismatch(SCORED.len(), count));

    let removed: usize = conn.query("ZREM", &[KEY, "member2"]).await?;
    let after: usize = conn.query("ZCARD", &[KEY]).await?;
    summary.record_covering(
        "ZREM",
        &["zrem"],
        removed == 1 && after == count.saturating_sub(removed),
        mismatch(count.saturating_sub(1), after),
    );

    Ok(())
}
