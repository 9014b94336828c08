use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    #[serde(rename = "PASSED")]
    Pass,
    #[serde(rename = "FAILED")]
    Fail,
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub name: String,
    pub status: Status,
    pub message: String,
    /// Registry command names this check exercises.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.status == Status::Pass
    }
}

/// Aggregate outcome of one harness run. One instance per run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    #[serde(rename = "total_tests")]
    total: usize,
    #[serde(rename = "passed_tests")]
    passed: usize,
    #[serde(rename = "failed_tests")]
    failed: usize,
    #[serde(rename = "test_details")]
    details: Vec<TestResult>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a check that covers no particular registry command.
    pub fn record(&mut self, name: &str, ok: bool, message: impl Into<String>) {
        self.record_covering(name, &[], ok, message);
    }

    /// Record a check and the commands it exercises. Never fails: a false
    /// predicate is stored as a failed result.
    pub fn record_covering(
        &mut self,
        name: &str,
        commands: &[&str],
        ok: bool,
        message: impl Into<String>,
    ) {
        let message = message.into();
        self.total += 1;
        let status = if ok {
            self.passed += 1;
            Status::Pass
        } else {
            self.failed += 1;
            Status::Fail
        };
        println!("{}", progress_line(name, status, &message));
        self.details.push(TestResult {
            name: name.to_string(),
            status,
            message,
            commands: commands.iter().map(|c| c.to_string()).collect(),
        });
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn details(&self) -> &[TestResult] {
        &self.details
    }

    pub fn failures(&self) -> impl Iterator<Item = &TestResult> {
        self.details.iter().filter(|t| !t.passed())
    }
}

/// One line of live progress: marker, check name and message.
pub fn progress_line(name: &str, status: Status, message: &str) -> String {
    match status {
        Status::Pass => format!("✅ {name}: passed - {message}"),
        Status::Fail => format!("❌ {name}: failed - {message}"),
    }
}
