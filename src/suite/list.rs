use std::collections::VecDeque;

use crate::backend::Connection;
use crate::error::BackendResult;
use crate::recorder::RunSummary;
use crate::suite::{mismatch, or_nil};

pub const KEY: &str = "test:list";
pub const KEYS: &[&str] = &[KEY];

pub async fn run<C: Connection>(conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
    let mut model = VecDeque::new();
    for (command, item) in [("LPUSH", "item1"), ("RPUSH", "item2"), ("LPUSH", "item0")] {
        conn.invoke(command, &[KEY, item]).await?;
        if command == "LPUSH" {
            model.push_front(item.to_string());
        } else {
            model.push_back(item.to_string());
        }
    }
    let expected: Vec<String> = model.iter().cloned().collect();

    let items: Vec<String> = conn.query("LRANGE", &[KEY, "0", "-1"]).await?;
    summary.record_covering(
        "LPUSH/RPUSH/LRANGE",
        &["lpush", "rpush", "lrange"],
        items == expected,
        mismatch(format!("{expected:?}"), format!("{items:?}")),
    );

    let length: usize = conn.query("LLEN", &[KEY]).await?;
    summary.record_covering("LLEN", &["llen"], length == model.len(), mismatch(model.len(), length));

    let head = model.pop_front();
    let tail = model.pop_back();
    let lpop: Option<String> = conn.query("LPOP", &[KEY]).await?;
    let rpop: Option<String> = conn.query("RPOP", &[KEY]).await?;
    summary.record_covering("LPOP", &["lpop"], lpop == head, mismatch(or_nil(&head), or_nil(&lpop)));
    summary.record_covering("RPOP", &["rpop"], rpop == tail, mismatch(or_nil(&tail), or_nil(&rpop)));

    Ok(())
}
