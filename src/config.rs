use std::path::PathBuf;
use std::time::Duration;

use crate::error::{ProbeError, ProbeResult};
use crate::report::CoverageMode;

/// Where to find the backend under test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} (db {})", self.host, self.port, self.db)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
    /// Per-call network timeout.
    pub timeout: Duration,
    pub out_dir: PathBuf,
    pub coverage: CoverageMode,
    /// Reset by deleting `test:*` keys instead of flushing the database.
    pub no_flush: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            password: None,
            timeout: Duration::from_secs(5),
            out_dir: PathBuf::from("."),
            coverage: CoverageMode::Declared,
            no_flush: false,
        }
    }
}

impl Config {
    /// Parse `[host] [port] [db] [password]` plus option flags.
    pub fn from_args(args: &[String]) -> ProbeResult<Self> {
        let mut config = Config::default();
        let mut positional = 0;
        let mut i = 0;
        while i < args.len() {
            match args[i].as_str() {
                "--out-dir" => {
                    if i + 1 < args.len() {
                        config.out_dir = PathBuf::from(&args[i + 1]);
                        i += 1;
                    }
                }
                "--timeout" => {
                    if i + 1 < args.len() {
                        let secs: u64 = parse("timeout", &args[i + 1])?;
                        if secs == 0 {
                            return Err(ProbeError::InvalidArgument {
                                name: "timeout",
                                value: args[i + 1].clone(),
                            });
                        }
                        config.timeout = Duration::from_secs(secs);
                        i += 1;
                    }
                }
                "--coverage" => {
                    if i + 1 < args.len() {
                        config.coverage = match args[i + 1].to_ascii_lowercase().as_str() {
                            "declared" => CoverageMode::Declared,
                            "heuristic" => CoverageMode::Heuristic,
                            _ => {
                                return Err(ProbeError::InvalidArgument {
                                    name: "coverage",
                                    value: args[i + 1].clone(),
                                });
                            }
                        };
                        i += 1;
                    }
                }
                "--no-flush" => config.no_flush = true,
                flag if flag.starts_with("--") => {
                    return Err(ProbeError::InvalidArgument {
                        name: "flag",
                        value: flag.to_string(),
                    });
                }
                arg => {
                    match positional {
                        0 => config.host = arg.to_string(),
                        1 => config.port = parse("port", arg)?,
                        2 => config.db = parse("db", arg)?,
                        3 => config.password = Some(arg.to_string()),
                        _ => {}
                    }
                    positional += 1;
                }
            }
            i += 1;
        }
        Ok(config)
    }

    pub fn target(&self) -> Target {
        Target {
            host: self.host.clone(),
            port: self.port,
            db: self.db,
            password: self.password.clone(),
        }
    }
}

fn parse<T: std::str::FromStr>(name: &'static str, value: &str) -> ProbeResult<T> {
    value.parse().map_err(|_| ProbeError::InvalidArgument {
        name,
        value: value.to_string(),
    })
}
