//! Execution of untrusted programs.
//!
//! A [`Sandbox`] runs one [`Invocation`] to completion or to its deadline,
//! whichever comes first, and always returns. [`run_test_case`] layers the
//! verdict rules for a single test case on top of it.

pub mod error;
pub mod process;

use async_trait::async_trait;
use common::Verdict;
use common::judge_job::TestCaseData;
use error::SandboxError;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub use process::ProcessGroupSandbox;

/// Program plus arguments, started from `cwd`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Per-run inputs and limits.
#[derive(Debug, Clone)]
pub struct ExecutionRequest<'a> {
    pub stdin: &'a [u8],
    /// Wall-clock deadline measured from spawn.
    pub time_limit: Duration,
    /// RLIMIT_AS in bytes. `None` leaves the inherited limit in place.
    pub address_space_limit: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    Signaled(i32),
    /// Deadline reached; the process group was killed.
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct Execution {
    pub termination: Termination,
    pub elapsed: Duration,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// Some output was dropped because it exceeded the capture cap.
    pub truncated: bool,
}

impl Execution {
    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

#[async_trait]
pub trait Sandbox: Send + Sync {
    /// Run to exit or deadline. Only failures to start or observe the process are errors.
    async fn execute(
        &self,
        invocation: &Invocation,
        request: &ExecutionRequest<'_>,
    ) -> Result<Execution, SandboxError>;
}

/// Limits applied to every test case of a submission.
#[derive(Debug, Clone, Copy)]
pub struct RunLimits {
    pub time_limit: Duration,
    pub address_space_limit: Option<u64>,
}

/// Classified result of one test case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCaseRun {
    pub verdict: Verdict,
    pub time_used_ms: i32,
    pub error: Option<String>,
}

/// Run `invocation` against one test case and classify the outcome.
pub async fn run_test_case(
    sandbox: &dyn Sandbox,
    invocation: &Invocation,
    test_case: &TestCaseData,
    limits: &RunLimits,
) -> Result<TestCaseRun, SandboxError> {
    let request = ExecutionRequest {
        stdin: test_case.input.as_bytes(),
        time_limit: limits.time_limit,
        address_space_limit: limits.address_space_limit,
    };
    let execution = sandbox.execute(invocation, &request).await?;
    if execution.truncated {
        warn!(
            test_case_id = test_case.id,
            "Output exceeded the capture limit and was truncated"
        );
    }
    Ok(classify(
        execution,
        test_case.expected_output.as_bytes(),
        limits.time_limit,
    ))
}

/// Verdict rules: deadline first, then exit status, then byte-exact stdout.
pub fn classify(execution: Execution, expected: &[u8], time_limit: Duration) -> TestCaseRun {
    let elapsed_ms = duration_ms(execution.elapsed);

    match execution.termination {
        Termination::TimedOut => TestCaseRun {
            verdict: Verdict::TimeLimitExceeded,
            time_used_ms: duration_ms(time_limit),
            error: Some("Time limit exceeded".to_string()),
        },
        Termination::Exited(0) if execution.stdout == expected => TestCaseRun {
            verdict: Verdict::Accepted,
            time_used_ms: elapsed_ms,
            error: None,
        },
        Termination::Exited(0) => TestCaseRun {
            verdict: Verdict::WrongAnswer,
            time_used_ms: elapsed_ms,
            error: Some("Output does not match expected output".to_string()),
        },
        Termination::Exited(code) => runtime_error(&execution, elapsed_ms, || {
            format!("exited with code {code}")
        }),
        Termination::Signaled(signal) => runtime_error(&execution, elapsed_ms, || {
            format!("terminated by signal {signal}")
        }),
    }
}

/// Stderr is the diagnostic; `describe` stands in when the program wrote none.
fn runtime_error(
    execution: &Execution,
    time_used_ms: i32,
    describe: impl FnOnce() -> String,
) -> TestCaseRun {
    let stderr = execution.stderr_lossy();
    TestCaseRun {
        verdict: Verdict::RuntimeError,
        time_used_ms,
        error: Some(if stderr.is_empty() { describe() } else { stderr }),
    }
}

fn duration_ms(duration: Duration) -> i32 {
    i32::try_from(duration.as_millis()).unwrap_or(i32::MAX)
}
