use crate::{SubmissionStatus, Verdict};
use serde::{Deserialize, Serialize};

/// Result for a single (submission, test case) execution. Append-only once persisted.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JudgeResult {
    /// Submission that was judged.
    pub submission_id: i32,
    /// Test case ID that was executed.
    pub test_case_id: i32,
    /// Verdict for this test case.
    pub verdict: Verdict,
    /// Time used in milliseconds. Equals the limit on timeout.
    pub time_used: i32,
    /// Memory used in kilobytes (not measured by the process sandbox, always 0).
    pub memory_used: i32,
    /// Diagnostic detail: stderr for runtime errors, a short message otherwise.
    pub error: Option<String>,
}

/// Final state of one judging attempt, as written onto the submission.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct JudgeOutcome {
    pub submission_id: i32,
    pub status: SubmissionStatus,
    pub time_used: i32,
    pub memory_used: i32,
    pub error: Option<String>,
    /// Per test case results, in evaluation order.
    pub results: Vec<JudgeResult>,
}

impl JudgeOutcome {
    /// The program never compiled; no test case was attempted.
    pub fn compilation_error(submission_id: i32, diagnostic: impl Into<String>) -> Self {
        Self {
            submission_id,
            status: SubmissionStatus::CompilationError,
            time_used: 0,
            memory_used: 0,
            error: Some(diagnostic.into()),
            results: vec![],
        }
    }

    /// The submission cannot be judged as configured.
    pub fn system_error(submission_id: i32, message: impl Into<String>) -> Self {
        Self {
            submission_id,
            status: SubmissionStatus::SystemError,
            time_used: 0,
            memory_used: 0,
            error: Some(message.into()),
            results: vec![],
        }
    }

    /// Build the outcome from the results of an early-exit run.
    ///
    /// The submission takes status, time and memory from the *last* result,
    /// which is either the first failing case or the final accepted one.
    /// Returns `None` when no test case ran.
    pub fn from_results(submission_id: i32, results: Vec<JudgeResult>) -> Option<Self> {
        let last = results.last()?;
        Some(Self {
            submission_id,
            status: last.verdict.into(),
            time_used: last.time_used,
            memory_used: last.memory_used,
            error: last.error.clone(),
            results,
        })
    }
}
