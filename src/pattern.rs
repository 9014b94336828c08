//! Local evaluation of `KEYS`-style patterns, so the expected answer to a
//! wildcard listing is computed without asking the backend.
//!
//! Supported syntax: `*`, `?`, `[abc]`, `[^abc]`, `[a-z]` and `\` escapes.

pub fn matches(pattern: &str, key: &str) -> bool {
    match_bytes(pattern.as_bytes(), key.as_bytes())
}

/// The sorted subset of `keys` matched by `pattern`.
pub fn select<'a>(pattern: &str, keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut hits: Vec<String> = keys
        .into_iter()
        .filter(|key| matches(pattern, key))
        .map(str::to_string)
        .collect();
    hits.sort();
    hits.dedup();
    hits
}

fn match_bytes(pattern: &[u8], key: &[u8]) -> bool {
    match pattern.split_first() {
        None => key.is_empty(),
        Some((b'*', rest)) => (0..=key.len()).any(|skip| match_bytes(rest, &key[skip..])),
        Some((b'?', rest)) => !key.is_empty() && match_bytes(rest, &key[1..]),
        Some((b'\\', rest)) if !rest.is_empty() => {
            key.first() == Some(&rest[0]) && match_bytes(&rest[1..], &key[1..])
        }
        Some((b'[', rest)) => {
            let Some(&ch) = key.first() else {
                return false;
            };
            match class(rest, ch) {
                Some((hit, used)) => hit && match_bytes(&rest[used..], &key[1..]),
                // unterminated class, `[` is literal
                None => ch == b'[' && match_bytes(rest, &key[1..]),
            }
        }
        Some((c, rest)) => key.first() == Some(c) && match_bytes(rest, &key[1..]),
    }
}

/// Evaluate a bracket class body (the bytes after `[`) against `ch`.
/// Returns whether it matched and how many bytes the class occupied,
/// closing `]` included.
fn class(body: &[u8], ch: u8) -> Option<(bool, usize)> {
    let (negate, mut i) = if body.first() == Some(&b'^') {
        (true, 1)
    } else {
        (false, 0)
    };
    let mut hit = false;
    while i < body.len() && body[i] != b']' {
        if i + 2 < body.len() && body[i + 1] == b'-' && body[i + 2] != b']' {
            let (lo, hi) = (body[i].min(body[i + 2]), body[i].max(body[i + 2]));
            hit |= (lo..=hi).contains(&ch);
            i += 3;
        } else {
            hit |= body[i] == ch;
            i += 1;
        }
    }
    (i < body.len()).then_some((hit != negate, i + 1))
}
