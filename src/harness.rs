use chrono::Local;
use tracing::{info, warn};

use crate::backend::{Connection, Connector};
use crate::config::Config;
use crate::error::{BackendError, BackendResult, ProbeError, ProbeResult};
use crate::recorder::RunSummary;
use crate::registry::CommandRegistry;
use crate::report::{self, ArtifactPaths, CoverageReport};
use crate::suite::{self, NAMESPACE, Suite};

/// Where a harness is in its single pass.
///
/// `Idle` is the state before a connection exists. `Harness::connect` is the
/// Idle to Connected transition, so a `Harness` value is never observed idle:
/// a failed connect returns an error instead of a harness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Connected,
    Running,
    Reported,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub summary: RunSummary,
    pub coverage: CoverageReport,
    pub artifacts: ArtifactPaths,
}

impl RunOutcome {
    pub fn all_passed(&self) -> bool {
        self.summary.failed() == 0
    }
}

/// Drives one run: connect, reset the namespace, run every suite in order,
/// report. The connection is owned here and dropped when the run ends.
pub struct Harness<C> {
    config: Config,
    registry: CommandRegistry,
    suites: Vec<Suite>,
    conn: Option<C>,
    phase: Phase,
}

impl<C: Connection> Harness<C> {
    pub async fn connect<K>(connector: &K, config: Config) -> ProbeResult<Self>
    where
        K: Connector<Conn = C>,
    {
        let target = config.target();
        let fail = |source: BackendError| ProbeError::Connect {
            target: target.to_string(),
            source,
        };
        let mut conn = connector
            .connect(&target, config.timeout)
            .await
            .map_err(fail)?;
        if !conn.ping().await {
            return Err(fail(BackendError::unexpected("PING", "no PONG from server")));
        }
        info!(%target, "connected");
        Ok(Harness {
            config,
            registry: CommandRegistry::standard(),
            suites: Suite::ALL.to_vec(),
            conn: Some(conn),
            phase: Phase::Connected,
        })
    }

    pub fn with_suites(mut self, suites: Vec<Suite>) -> Self {
        self.suites = suites;
        self
    }

    pub fn with_registry(mut self, registry: CommandRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub async fn run(&mut self) -> ProbeResult<RunOutcome> {
        let Some(mut conn) = self.conn.take() else {
            return Err(ProbeError::NotConnected);
        };
        self.phase = Phase::Running;

        let mut summary = RunSummary::new();
        summary.start_time = Some(timestamp());
        println!("\n======== Running command checks ========");

        match reset_namespace(&mut conn, self.config.no_flush).await {
            Ok(()) => info!("test namespace cleared"),
            Err(e) => warn!(error = %e, "could not clear test namespace, continuing"),
        }

        for suite in &self.suites {
            suite::run_suite(*suite, &mut conn, &mut summary).await;
        }
        summary.end_time = Some(timestamp());

        report::print_summary(&summary);
        let coverage = CoverageReport::compute(&summary, &self.registry, self.config.coverage);
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let artifacts = report::write_artifacts(&self.config.out_dir, &stamp, &summary, &coverage)?;
        println!("\nRun report:      {}", artifacts.report.display());
        println!("Command support: {}", artifacts.coverage.display());
        self.phase = Phase::Reported;

        drop(conn);
        Ok(RunOutcome {
            summary,
            coverage,
            artifacts,
        })
    }
}

async fn reset_namespace<C: Connection>(conn: &mut C, no_flush: bool) -> BackendResult<()> {
    if !no_flush {
        conn.invoke("FLUSHDB", &[]).await?;
        return Ok(());
    }
    let keys: Vec<String> = conn.query("KEYS", &[NAMESPACE]).await?;
    if keys.is_empty() {
        return Ok(());
    }
    let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
    conn.invoke("DEL", &keys).await?;
    Ok(())
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}
