/// The command surface a run is expected to cover, grouped by category.
///
/// Category and command order are preserved everywhere the registry is
/// rendered.
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    categories: Vec<(&'static str, &'static [&'static str])>,
}

const STANDARD: &[(&str, &[&str])] = &[
    ("string", &["set", "get", "append", "incr", "decr", "strlen"]),
    ("hash", &["hset", "hget", "hgetall", "hkeys", "hvals", "hdel"]),
    ("list", &["lpush", "rpush", "lpop", "rpop", "llen", "lrange"]),
    ("set", &["sadd", "smembers", "sismember", "scard", "srem"]),
    ("zset", &["zadd", "zrange", "zscore", "zcard", "zrem"]),
    ("keys", &["keys", "exists", "expire", "ttl", "del"]),
    ("transaction", &["multi", "exec", "discard"]),
    ("pubsub", &["publish", "subscribe"]),
    ("script", &["eval", "evalsha"]),
];

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandRegistry {
    pub fn standard() -> Self {
        CommandRegistry {
            categories: STANDARD.to_vec(),
        }
    }

    pub fn new(categories: Vec<(&'static str, &'static [&'static str])>) -> Self {
        CommandRegistry { categories }
    }

    pub fn categories(&self) -> impl Iterator<Item = (&'static str, &'static [&'static str])> + '_ {
        self.categories.iter().copied()
    }

    pub fn commands(&self, category: &str) -> Option<&'static [&'static str]> {
        self.categories
            .iter()
            .find(|(name, _)| *name == category)
            .map(|(_, commands)| *commands)
    }

    pub fn len(&self) -> usize {
        self.categories.iter().map(|(_, commands)| commands.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
