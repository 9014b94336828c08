use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use tracing::info;

use crate::error::ProbeResult;
use crate::recorder::{RunSummary, TestResult};
use crate::registry::CommandRegistry;

/// How passed checks are matched against registry commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CoverageMode {
    /// A command is covered when a passed check declares it.
    #[default]
    Declared,
    /// A command is covered when a passed check's name equals or contains
    /// it, ignoring case. Approximate: `HSET/HGET` also covers `set`.
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSupport {
    pub command: String,
    pub supported: bool,
}

/// Per-category cross-reference of declared against exercised commands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoverageReport {
    categories: Vec<(String, Vec<CommandSupport>)>,
}

impl CoverageReport {
    pub fn compute(summary: &RunSummary, registry: &CommandRegistry, mode: CoverageMode) -> Self {
        let passed: Vec<&TestResult> = summary.details().iter().filter(|t| t.passed()).collect();
        let categories = registry
            .categories()
            .map(|(category, commands)| {
                let rows = commands
                    .iter()
                    .map(|command| CommandSupport {
                        command: command.to_string(),
                        supported: passed.iter().any(|t| covers(t, command, mode)),
                    })
                    .collect();
                (category.to_string(), rows)
            })
            .collect();
        CoverageReport { categories }
    }

    pub fn category(&self, name: &str) -> Option<&[CommandSupport]> {
        self.categories
            .iter()
            .find(|(category, _)| category == name)
            .map(|(_, rows)| rows.as_slice())
    }

    pub fn is_supported(&self, category: &str, command: &str) -> bool {
        self.category(category)
            .and_then(|rows| rows.iter().find(|r| r.command == command))
            .is_some_and(|r| r.supported)
    }

    pub fn supported_count(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|(_, rows)| rows)
            .filter(|r| r.supported)
            .count()
    }
}

impl Serialize for CoverageReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.categories.len()))?;
        for (category, rows) in &self.categories {
            map.serialize_entry(category, rows)?;
        }
        map.end()
    }
}

fn covers(test: &TestResult, command: &str, mode: CoverageMode) -> bool {
    match mode {
        CoverageMode::Declared => test.commands.iter().any(|c| c.eq_ignore_ascii_case(command)),
        CoverageMode::Heuristic => test
            .name
            .to_uppercase()
            .contains(&command.to_uppercase()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub report: PathBuf,
    pub coverage: PathBuf,
}

/// Print the closing summary block to stdout.
pub fn print_summary(summary: &RunSummary) {
    println!("\n======== Test report ========");
    println!("Started:  {}", summary.start_time.as_deref().unwrap_or("-"));
    println!("Finished: {}", summary.end_time.as_deref().unwrap_or("-"));
    println!("Total:    {}", summary.total());
    println!("Passed:   {}", summary.passed());
    println!("Failed:   {}", summary.failed());

    if summary.failed() > 0 {
        println!("\nFailed checks:");
        for test in summary.failures() {
            println!("  - {}: {}", test.name, test.message);
        }
    }
}

/// Persist the run report and the coverage cross-reference under `dir`,
/// both named after `stamp`.
pub fn write_artifacts(
    dir: &Path,
    stamp: &str,
    summary: &RunSummary,
    coverage: &CoverageReport,
) -> ProbeResult<ArtifactPaths> {
    std::fs::create_dir_all(dir)?;
    let paths = ArtifactPaths {
        report: dir.join(format!("kvprobe_report_{stamp}.json")),
        coverage: dir.join(format!("kvprobe_coverage_{stamp}.json")),
    };
    write_json(&paths.report, summary)?;
    info!(path = %paths.report.display(), "run report written");
    write_json(&paths.coverage, coverage)?;
    info!(path = %paths.coverage.display(), "coverage report written");
    Ok(paths)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> ProbeResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
