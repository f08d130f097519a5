use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Test case data needed for judging.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCaseData {
    /// Test case ID
    pub id: i32,
    /// Input data to feed to the program
    pub input: String,
    /// Expected output, compared byte for byte
    #[serde(alias = "output")]
    pub expected_output: String,
    /// Whether the case is shown to contestants as a sample
    #[serde(default)]
    pub is_sample: bool,
}

/// A submission-evaluation request consumed from the queue.
///
/// Deserializes from either the flat form this type serializes to, or a
/// serialized Submission whose limits sit on its nested `problem`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SubmissionMessage")]
pub struct JudgeJob {
    /// ID of the submission being judged
    pub submission_id: i32,
    /// Owner of the submission
    pub user_id: i32,
    /// ID of the problem
    pub problem_id: i32,
    /// Contest ID if this is a contest submission
    pub contest_id: Option<i32>,
    /// Language tag (e.g., "cpp", "java", "python")
    pub language: String,
    /// Source code text
    pub code: String,
    /// Time limit in milliseconds
    pub time_limit: i32,
    /// Memory limit in megabytes
    pub memory_limit: i32,
}

#[derive(Deserialize)]
struct ProblemLimits {
    #[serde(default)]
    time_limit: Option<i32>,
    #[serde(default)]
    memory_limit: Option<i32>,
}

#[derive(Deserialize)]
struct SubmissionMessage {
    #[serde(alias = "id")]
    submission_id: i32,
    user_id: i32,
    problem_id: i32,
    #[serde(default)]
    contest_id: Option<i32>,
    language: String,
    code: String,
    #[serde(default)]
    time_limit: Option<i32>,
    #[serde(default)]
    memory_limit: Option<i32>,
    #[serde(default)]
    problem: Option<ProblemLimits>,
}

impl TryFrom<SubmissionMessage> for JudgeJob {
    type Error = String;

    fn try_from(message: SubmissionMessage) -> Result<Self, Self::Error> {
        let (nested_time, nested_memory) = message
            .problem
            .map(|p| (p.time_limit, p.memory_limit))
            .unwrap_or_default();
        let time_limit = message
            .time_limit
            .or(nested_time)
            .ok_or("missing time_limit (top level or problem.time_limit)")?;

        Ok(Self {
            submission_id: message.submission_id,
            user_id: message.user_id,
            problem_id: message.problem_id,
            contest_id: message.contest_id,
            language: message.language,
            code: message.code,
            time_limit,
            // Undeclared memory limit is 0, i.e. unlimited.
            memory_limit: message.memory_limit.or(nested_memory).unwrap_or(0),
        })
    }
}

impl JudgeJob {
    /// Per-test-case wall-clock limit. Negative limits are treated as zero.
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit.max(0) as u64)
    }

    /// Memory limit in bytes, or `None` when the problem does not declare one.
    pub fn memory_limit_bytes(&self) -> Option<u64> {
        (self.memory_limit > 0).then(|| self.memory_limit as u64 * 1024 * 1024)
    }
}
