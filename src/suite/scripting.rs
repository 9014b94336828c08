use crate::backend::Connection;
use crate::error::BackendResult;
use crate::recorder::RunSummary;
use crate::suite::{mismatch, or_nil};

pub const KEY: &str = "test:lua";
pub const KEYS: &[&str] = &[KEY];

/// Writes ARGV[1] to KEYS[1] and reads it back through the server.
pub const SET_THEN_GET: &str = "redis.call('SET', KEYS[1], ARGV[1])\nreturn redis.call('GET', KEYS[1])";

const VALUE: &str = "Lua Value";

pub async fn run<C: Connection>(conn: &mut C, summary: &mut RunSummary) -> BackendResult<()> {
    let result: Option<String> = conn.query("EVAL", &[SET_THEN_GET, "1", KEY, VALUE]).await?;
    summary.record_covering(
        "EVAL",
        &["eval"],
        result.as_deref() == Some(VALUE),
        mismatch(VALUE, or_nil(&result)),
    );

    let digest = script_digest(SET_THEN_GET);
    let loaded: String = conn.query("SCRIPT", &["LOAD", SET_THEN_GET]).await?;
    let result: Option<String> = conn.query("EVALSHA", &[loaded.as_str(), "1", KEY, VALUE]).await?;
    summary.record_covering(
        "EVALSHA",
        &["evalsha"],
        loaded == digest && result.as_deref() == Some(VALUE),
        format!(
            "expected sha {digest} returning {VALUE}, got {loaded} returning {}",
            or_nil(&result)
        ),
    );

    Ok(())
}

/// Hex SHA-1 of a script body, the name SCRIPT LOAD gives it.
pub fn script_digest(body: &str) -> String {
    sha1_smol::Sha1::from(body).digest().to_string()
}
