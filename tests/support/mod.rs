//! In-memory stand-in for a Redis-compatible server.
//!
//! Implements just enough of the command surface for the suites, plus
//! fault injection: a command can be made to fail outright or to return a
//! subtly wrong reply. Handles are cheap clones over shared state so a test
//! can inspect the store after the harness has dropped its connection.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use kvprobe::backend::{Connection, Connector};
use kvprobe::config::{Config, Target};
use kvprobe::error::{BackendError, BackendResult};
use kvprobe::pattern;
use kvprobe::suite::scripting::{SET_THEN_GET, script_digest};
use redis::Value;

#[derive(Debug, Clone)]
enum Entry {
    Str(String),
    Hash(BTreeMap<String, String>),
    List(VecDeque<String>),
    Set(BTreeSet<String>),
    ZSet(Vec<(String, f64)>),
}

#[derive(Debug, Default)]
struct State {
    data: BTreeMap<String, Entry>,
    ttls: HashMap<String, i64>,
    queue: Option<Vec<(String, Vec<String>)>>,
    scripts: HashMap<String, String>,
    subscribers: BTreeSet<String>,
    log: Vec<String>,
    fail_on: Option<String>,
    wrong_answer: Option<String>,
    refuse_ping: bool,
    leaky_discard: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    state: Rc<RefCell<State>>,
}

type Reply = BackendResult<Value>;

fn err(msg: &str) -> BackendError {
    BackendError::Reply(msg.to_string())
}

fn bulk(s: &str) -> Value {
    Value::BulkString(s.as_bytes().to_vec())
}

fn bulks<'a>(items: impl IntoIterator<Item = &'a String>) -> Value {
    Value::Array(items.into_iter().map(|s| bulk(s)).collect())
}

fn wrong_type() -> BackendError {
    err("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn arity(args: &[String], n: usize) -> BackendResult<()> {
    if args.len() < n {
        Err(err("ERR wrong number of arguments"))
    } else {
        Ok(())
    }
}

fn int_arg(s: &str) -> BackendResult<i64> {
    s.parse().map_err(|_| err("ERR value is not an integer or out of range"))
}

/// Resolve a Redis-style inclusive range over `len` items.
fn span(len: usize, start: &str, stop: &str) -> BackendResult<std::ops::Range<usize>> {
    let len = len as i64;
    let norm = |i: i64| if i < 0 { (len + i).max(0) } else { i };
    let start = norm(int_arg(start)?);
    let stop = norm(int_arg(stop)?).min(len - 1);
    if start > stop || start >= len {
        return Ok(0..0);
    }
    Ok(start as usize..stop as usize + 1)
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call to `command` fail with a server error.
    pub fn fail_on(self, command: &str) -> Self {
        self.state.borrow_mut().fail_on = Some(command.to_uppercase());
        self
    }

    /// Make `command` return a plausible but wrong reply.
    pub fn wrong_answer(self, command: &str) -> Self {
        self.state.borrow_mut().wrong_answer = Some(command.to_uppercase());
        self
    }

    /// Make DISCARD apply the queued writes instead of dropping them.
    pub fn leaky_discard(self) -> Self {
        self.state.borrow_mut().leaky_discard = true;
        self
    }

    pub fn refuse_ping(self) -> Self {
        self.state.borrow_mut().refuse_ping = true;
        self
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.state
            .borrow_mut()
            .data
            .insert(key.to_string(), Entry::Str(value.to_string()));
    }

    pub fn keys(&self) -> Vec<String> {
        self.state.borrow().data.keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.state.borrow().data.contains_key(key)
    }

    pub fn in_multi(&self) -> bool {
        self.state.borrow().queue.is_some()
    }

    pub fn subscriber_count(&self) -> usize {
        self.state.borrow().subscribers.len()
    }

    /// Every command name received, in order.
    pub fn log(&self) -> Vec<String> {
        self.state.borrow().log.clone()
    }

    pub fn connector(&self) -> MemoryConnector {
        MemoryConnector {
            backend: self.clone(),
            refuse: false,
        }
    }
}

impl State {
    fn dispatch(&mut self, name: &str, args: &[String]) -> Reply {
        if let Some(queue) = self.queue.as_mut() {
            if !matches!(name, "EXEC" | "DISCARD" | "MULTI") {
                queue.push((name.to_string(), args.to_vec()));
                return Ok(Value::SimpleString("QUEUED".to_string()));
            }
        }

        match name {
            "PING" => Ok(Value::SimpleString("PONG".to_string())),
            "FLUSHDB" => {
                self.data.clear();
                self.ttls.clear();
                Ok(Value::Okay)
            }
            "MULTI" => {
                if self.queue.is_some() {
                    return Err(err("ERR MULTI calls can not be nested"));
                }
                self.queue = Some(Vec::new());
                Ok(Value::Okay)
            }
            "EXEC" => {
                let queue = self.queue.take().ok_or_else(|| err("ERR EXEC without MULTI"))?;
                let mut results = Vec::with_capacity(queue.len());
                for (cmd, cmd_args) in queue {
                    results.push(self.dispatch(&cmd, &cmd_args)?);
                }
                Ok(Value::Array(results))
            }
            "DISCARD" => {
                let queue = self
                    .queue
                    .take()
                    .ok_or_else(|| err("ERR DISCARD without MULTI"))?;
                if self.leaky_discard {
                    for (cmd, cmd_args) in queue {
                        self.dispatch(&cmd, &cmd_args)?;
                    }
                }
                Ok(Value::Okay)
            }
            "PUBLISH" => {
                arity(args, 2)?;
                let count = self.subscribers.iter().filter(|c| **c == args[0]).count();
                Ok(Value::Int(count as i64))
            }
            "EVAL" => {
                arity(args, 2)?;
                self.eval(&args[0], &args[1..])
            }
            "EVALSHA" => {
                arity(args, 2)?;
                let body = self
                    .scripts
                    .get(&args[0])
                    .cloned()
                    .ok_or_else(|| err("NOSCRIPT No matching script"))?;
                self.eval(&body, &args[1..])
            }
            "SCRIPT" => {
                arity(args, 2)?;
                if !args[0].eq_ignore_ascii_case("LOAD") {
                    return Err(err("ERR unknown subcommand"));
                }
                let sha = script_digest(&args[1]);
                self.scripts.insert(sha.clone(), args[1].clone());
                Ok(bulk(&sha))
            }
            _ => self.data_command(name, args),
        }
    }

    fn eval(&mut self, body: &str, rest: &[String]) -> Reply {
        let numkeys = int_arg(&rest[0])? as usize;
        let (keys, argv) = rest[1..].split_at(numkeys.min(rest.len() - 1));
        if body != SET_THEN_GET || keys.is_empty() || argv.is_empty() {
            return Err(err("ERR unsupported script"));
        }
        self.dispatch("SET", &[keys[0].clone(), argv[0].clone()])?;
        self.dispatch("GET", &[keys[0].clone()])
    }

    fn data_command(&mut self, name: &str, args: &[String]) -> Reply {
        match name {
            "SET" => {
                arity(args, 2)?;
                self.data.insert(args[0].clone(), Entry::Str(args[1].clone()));
                self.ttls.remove(&args[0]);
                Ok(Value::Okay)
            }
            "GET" => {
                arity(args, 1)?;
                match self.data.get(&args[0]) {
                    None => Ok(Value::Nil),
                    Some(Entry::Str(s)) => Ok(bulk(s)),
                    Some(_) => Err(wrong_type()),
                }
            }
            "APPEND" => {
                arity(args, 2)?;
                let entry = self
                    .data
                    .entry(args[0].clone())
                    .or_insert_with(|| Entry::Str(String::new()));
                let Entry::Str(s) = entry else {
                    return Err(wrong_type());
                };
                s.push_str(&args[1]);
                Ok(Value::Int(s.len() as i64))
            }
            "INCR" | "DECR" | "INCRBY" => {
                arity(args, 1)?;
                let delta = match name {
                    "INCR" => 1,
                    "DECR" => -1,
                    _ => {
                        arity(args, 2)?;
                        int_arg(&args[1])?
                    }
                };
                let entry = self
                    .data
                    .entry(args[0].clone())
                    .or_insert_with(|| Entry::Str("0".to_string()));
                let Entry::Str(s) = entry else {
                    return Err(wrong_type());
                };
                let next = int_arg(s)? + delta;
                *s = next.to_string();
                Ok(Value::Int(next))
            }
            "STRLEN" => {
                arity(args, 1)?;
                match self.data.get(&args[0]) {
                    None => Ok(Value::Int(0)),
                    Some(Entry::Str(s)) => Ok(Value::Int(s.len() as i64)),
                    Some(_) => Err(wrong_type()),
                }
            }
            "DEL" => {
                let mut removed = 0;
                for key in args {
                    self.ttls.remove(key);
                    if self.data.remove(key).is_some() {
                        removed += 1;
                    }
                }
                Ok(Value::Int(removed))
            }
            "EXISTS" => Ok(Value::Int(
                args.iter().filter(|k| self.data.contains_key(*k)).count() as i64,
            )),
            "KEYS" => {
                arity(args, 1)?;
                let hits: Vec<&String> = self
                    .data
                    .keys()
                    .filter(|k| pattern::matches(&args[0], k))
                    .collect();
                Ok(bulks(hits))
            }
            "EXPIRE" => {
                arity(args, 2)?;
                if !self.data.contains_key(&args[0]) {
                    return Ok(Value::Int(0));
                }
                self.ttls.insert(args[0].clone(), int_arg(&args[1])?);
                Ok(Value::Int(1))
            }
            "TTL" => {
                arity(args, 1)?;
                if !self.data.contains_key(&args[0]) {
                    return Ok(Value::Int(-2));
                }
                Ok(Value::Int(self.ttls.get(&args[0]).copied().unwrap_or(-1)))
            }
            "HSET" | "HGET" | "HGETALL" | "HKEYS" | "HVALS" | "HDEL" => self.hash_command(name, args),
            "LPUSH" | "RPUSH" | "LRANGE" | "LLEN" | "LPOP" | "RPOP" => self.list_command(name, args),
            "SADD" | "SMEMBERS" | "SISMEMBER" | "SCARD" | "SREM" => self.set_command(name, args),
            "ZADD" | "ZRANGE" | "ZSCORE" | "ZCARD" | "ZREM" => self.zset_command(name, args),
            other => Err(BackendError::Reply(format!("ERR unknown command '{other}'"))),
        }
    }

    fn hash_command(&mut self, name: &str, args: &[String]) -> Reply {
        arity(args, 1)?;
        if name == "HSET" && !self.data.contains_key(&args[0]) {
            self.data.insert(args[0].clone(), Entry::Hash(BTreeMap::new()));
        }
        let hash = match self.data.get_mut(&args[0]) {
            Some(Entry::Hash(h)) => h,
            Some(_) => return Err(wrong_type()),
            None => {
                return Ok(match name {
                    "HGET" => Value::Nil,
                    "HDEL" => Value::Int(0),
                    _ => Value::Array(vec![]),
                });
            }
        };
        let reply = match name {
            "HSET" => {
                let mut added = 0;
                for pair in args[1..].chunks(2) {
                    if pair.len() == 2 && hash.insert(pair[0].clone(), pair[1].clone()).is_none() {
                        added += 1;
                    }
                }
                Value::Int(added)
            }
            "HGET" => {
                arity(args, 2)?;
                hash.get(&args[1]).map_or(Value::Nil, |v| bulk(v))
            }
            "HGETALL" => Value::Array(
                hash.iter()
                    .flat_map(|(f, v)| [bulk(f), bulk(v)])
                    .collect(),
            ),
            "HKEYS" => bulks(hash.keys()),
            "HVALS" => bulks(hash.values()),
            _ => {
                let removed = args[1..].iter().filter(|f| hash.remove(*f).is_some()).count();
                Value::Int(removed as i64)
            }
        };
        if hash.is_empty() {
            self.data.remove(&args[0]);
        }
        Ok(reply)
    }

    fn list_command(&mut self, name: &str, args: &[String]) -> Reply {
        arity(args, 1)?;
        if matches!(name, "LPUSH" | "RPUSH") && !self.data.contains_key(&args[0]) {
            self.data.insert(args[0].clone(), Entry::List(VecDeque::new()));
        }
        let list = match self.data.get_mut(&args[0]) {
            Some(Entry::List(l)) => l,
            Some(_) => return Err(wrong_type()),
            None => {
                return Ok(match name {
                    "LRANGE" => Value::Array(vec![]),
                    "LLEN" => Value::Int(0),
                    _ => Value::Nil,
                });
            }
        };
        let reply = match name {
            "LPUSH" | "RPUSH" => {
                for item in &args[1..] {
                    if name == "LPUSH" {
                        list.push_front(item.clone());
                    } else {
                        list.push_back(item.clone());
                    }
                }
                Value::Int(list.len() as i64)
            }
            "LRANGE" => {
                arity(args, 3)?;
                let range = span(list.len(), &args[1], &args[2])?;
                bulks(list.range(range))
            }
            "LLEN" => Value::Int(list.len() as i64),
            "LPOP" => list.pop_front().map_or(Value::Nil, |v| bulk(&v)),
            _ => list.pop_back().map_or(Value::Nil, |v| bulk(&v)),
        };
        if list.is_empty() {
            self.data.remove(&args[0]);
        }
        Ok(reply)
    }

    fn set_command(&mut self, name: &str, args: &[String]) -> Reply {
        arity(args, 1)?;
        if name == "SADD" && !self.data.contains_key(&args[0]) {
            self.data.insert(args[0].clone(), Entry::Set(BTreeSet::new()));
        }
        let set = match self.data.get_mut(&args[0]) {
            Some(Entry::Set(s)) => s,
            Some(_) => return Err(wrong_type()),
            None => {
                return Ok(match name {
                    "SMEMBERS" => Value::Array(vec![]),
                    _ => Value::Int(0),
                });
            }
        };
        let reply = match name {
            "SADD" => Value::Int(args[1..].iter().filter(|m| set.insert((*m).clone())).count() as i64),
            "SMEMBERS" => bulks(set.iter()),
            "SISMEMBER" => {
                arity(args, 2)?;
                Value::Int(set.contains(&args[1]) as i64)
            }
            "SCARD" => Value::Int(set.len() as i64),
            _ => Value::Int(args[1..].iter().filter(|m| set.remove(*m)).count() as i64),
        };
        if set.is_empty() {
            self.data.remove(&args[0]);
        }
        Ok(reply)
    }

    fn zset_command(&mut self, name: &str, args: &[String]) -> Reply {
        arity(args, 1)?;
        if name == "ZADD" && !self.data.contains_key(&args[0]) {
            self.data.insert(args[0].clone(), Entry::ZSet(Vec::new()));
        }
        let zset = match self.data.get_mut(&args[0]) {
            Some(Entry::ZSet(z)) => z,
            Some(_) => return Err(wrong_type()),
            None => {
                return Ok(match name {
                    "ZRANGE" => Value::Array(vec![]),
                    "ZSCORE" => Value::Nil,
                    _ => Value::Int(0),
                });
            }
        };
        let reply = match name {
            "ZADD" => {
                let mut added = 0;
                for pair in args[1..].chunks(2) {
                    if pair.len() != 2 {
                        return Err(err("ERR syntax error"));
                    }
                    let score: f64 = pair[0].parse().map_err(|_| err("ERR value is not a valid float"))?;
                    match zset.iter_mut().find(|(m, _)| *m == pair[1]) {
                        Some(entry) => entry.1 = score,
                        None => {
                            zset.push((pair[1].clone(), score));
                            added += 1;
                        }
                    }
                }
                zset.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
                Value::Int(added)
            }
            "ZRANGE" => {
                arity(args, 3)?;
                let range = span(zset.len(), &args[1], &args[2])?;
                let with_scores = args.get(3).is_some_and(|a| a.eq_ignore_ascii_case("WITHSCORES"));
                let mut items = Vec::new();
                for (member, score) in &zset[range] {
                    items.push(bulk(member));
                    if with_scores {
                        items.push(bulk(&score.to_string()));
                    }
                }
                Value::Array(items)
            }
            "ZSCORE" => {
                arity(args, 2)?;
                zset.iter()
                    .find(|(m, _)| *m == args[1])
                    .map_or(Value::Nil, |(_, s)| bulk(&s.to_string()))
            }
            "ZCARD" => Value::Int(zset.len() as i64),
            _ => {
                let before = zset.len();
                zset.retain(|(m, _)| !args[1..].contains(m));
                Value::Int((before - zset.len()) as i64)
            }
        };
        if zset.is_empty() {
            self.data.remove(&args[0]);
        }
        Ok(reply)
    }
}

/// Plausible but wrong version of a reply.
fn skew(command: &str, reply: Value) -> Value {
    match reply {
        // member/score pairs in descending order
        Value::Array(items) if command == "ZRANGE" => {
            Value::Array(items.chunks(2).rev().flatten().cloned().collect())
        }
        Value::Int(n) => Value::Int(n + 1),
        Value::BulkString(mut bytes) => {
            bytes.push(b'?');
            Value::BulkString(bytes)
        }
        Value::Array(mut items) => {
            items.pop();
            Value::Array(items)
        }
        other => other,
    }
}

impl Connection for MemoryBackend {
    async fn invoke(&mut self, command: &str, args: &[&str]) -> BackendResult<Value> {
        let mut state = self.state.borrow_mut();
        let name = command.to_uppercase();
        state.log.push(name.clone());
        if state.fail_on.as_deref() == Some(name.as_str()) {
            return Err(BackendError::Reply(format!("ERR injected failure for {name}")));
        }
        if name == "PING" && state.refuse_ping {
            return Ok(Value::Nil);
        }
        let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
        let reply = state.dispatch(&name, &args)?;
        if state.wrong_answer.as_deref() == Some(name.as_str()) {
            return Ok(skew(&name, reply));
        }
        Ok(reply)
    }

    async fn subscribe(&mut self, channel: &str) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        state.log.push("SUBSCRIBE".to_string());
        if state.fail_on.as_deref() == Some("SUBSCRIBE") {
            return Err(BackendError::Reply("ERR injected failure for SUBSCRIBE".to_string()));
        }
        state.subscribers.insert(channel.to_string());
        Ok(())
    }

    async fn unsubscribe(&mut self, channel: &str) -> BackendResult<()> {
        let mut state = self.state.borrow_mut();
        state.log.push("UNSUBSCRIBE".to_string());
        state.subscribers.remove(channel);
        Ok(())
    }
}

pub struct MemoryConnector {
    pub backend: MemoryBackend,
    pub refuse: bool,
}

impl MemoryConnector {
    pub fn refusing() -> Self {
        MemoryConnector {
            backend: MemoryBackend::new(),
            refuse: true,
        }
    }
}

impl Connector for MemoryConnector {
    type Conn = MemoryBackend;

    async fn connect(&self, _target: &Target, _timeout: Duration) -> BackendResult<MemoryBackend> {
        if self.refuse {
            return Err(BackendError::Reply("Connection refused (os error 111)".to_string()));
        }
        Ok(self.backend.clone())
    }
}

/// Config writing artifacts into `dir`.
pub fn config_in(dir: &std::path::Path) -> Config {
    Config {
        out_dir: dir.to_path_buf(),
        ..Config::default()
    }
}
