//! Feature checks, one file per command family.
//!
//! Each suite owns a fixed set of keys under the `test:` prefix. Whatever
//! happens inside a suite, its keys are deleted before the next one runs,
//! and a backend error ends only that suite.

pub mod hash;
pub mod key;
pub mod list;
pub mod pubsub;
pub mod scripting;
pub mod set;
pub mod sorted_set;
pub mod string;
pub mod transaction;

use std::fmt::Display;

use tracing::warn;

use crate::backend::Connection;
use crate::error::BackendResult;
use crate::recorder::RunSummary;

/// Pattern covering every key a suite may write.
pub const NAMESPACE: &str = "test:*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Suite {
    Strings,
    Hashes,
    Lists,
    Sets,
    SortedSets,
    Keys,
    Transactions,
    PubSub,
    Scripting,
}

impl Suite {
    /// Default run order.
    pub const ALL: [Suite; 9] = [
        Suite::Strings,
        Suite::Hashes,
        Suite::Lists,
        Suite::Sets,
        Suite::SortedSets,
        Suite::Keys,
        Suite::Transactions,
        Suite::PubSub,
        Suite::Scripting,
    ];

    /// Registry category this suite covers.
    pub fn category(self) -> &'static str {
        match self {
            Suite::Strings => "string",
            Suite::Hashes => "hash",
            Suite::Lists => "list",
            Suite::Sets => "set",
            Suite::SortedSets => "zset",
            Suite::Keys => "keys",
            Suite::Transactions => "transaction",
            Suite::PubSub => "pubsub",
            Suite::Scripting => "script",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Suite::Strings => "String commands",
            Suite::Hashes => "Hash commands",
            Suite::Lists => "List commands",
            Suite::Sets => "Set commands",
            Suite::SortedSets => "Sorted set commands",
            Suite::Keys => "Key commands",
            Suite::Transactions => "Transactions",
            Suite::PubSub => "Publish/subscribe",
            Suite::Scripting => "Lua scripting",
        }
    }

    /// Keys deleted after the suite, on every path.
    pub fn keys(self) -> &'static [&'static str] {
        match self {
            Suite::Strings => string::KEYS,
            Suite::Hashes => hash::KEYS,
            Suite::Lists => list::KEYS,
            Suite::Sets => set::KEYS,
            Suite::SortedSets => sorted_set::KEYS,
            Suite::Keys => key::KEYS,
            Suite::Transactions => transaction::KEYS,
            Suite::PubSub => &[],
            Suite::Scripting => scripting::KEYS,
        }
    }

    async fn steps<C: Connection>(self, conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
        match self {
            Suite::Strings => string::run(conn, summary).await,
            Suite::Hashes => hash::run(conn, summary).await,
            Suite::Lists => list::run(conn, summary).await,
            Suite::Sets => set::run(conn, summary).await,
            Suite::SortedSets => sorted_set::run(conn, summary).await,
            Suite::Keys => key::run(conn, summary).await,
            Suite::Transactions => transaction::run(conn, summary).await,
            Suite::PubSub => pubsub::run(conn, summary).await,
            Suite::Scripting => scripting::run(conn, summary).await,
        }
    }
}

/// Run one suite, release what it holds, and turn an aborting backend
/// error into a single failed check named after the suite.
pub async fn run_suite<C: Connection>(suite: Suite, conn: &mut C, summary: &mut RunSummary) {
    println!("\n----- {} -----", suite.title());
    let outcome = suite.steps(conn, summary).await;
    release(suite, conn, outcome.is_err()).await;
    if let Err(e) = outcome {
        warn!(suite = suite.category(), error = %e, "suite aborted");
        summary.record(suite.title(), false, e.to_string());
    }
}

async fn release<C: Connection>(suite: Suite, conn: &mut C, aborted: bool) {
    if suite == Suite::Transactions && aborted {
        transaction::leave_multi(conn).await;
    }
    if suite == Suite::PubSub {
        if let Err(e) = conn.unsubscribe(pubsub::CHANNEL).await {
            warn!(channel = pubsub::CHANNEL, error = %e, "unsubscribe failed");
        }
    }
    let keys = suite.keys();
    if keys.is_empty() {
        return;
    }
    if let Err(e) = conn.invoke("DEL", keys).await {
        warn!(suite = suite.category(), error = %e, "cleanup failed");
    }
}

pub(crate) fn mismatch(expected: impl Display, actual: impl Display) -> String {
    format!("expected: {expected}, actual: {actual}")
}

pub(crate) fn or_nil(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("(nil)")
}
