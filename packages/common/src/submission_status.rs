#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a submission during the judging lifecycle.
///
/// The wire and column representation is snake_case (`time_limit`, not
/// `time_limit_exceeded`), matching what the intake API already stores.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStatus {
    /// Waiting to be judged, or the last judging attempt faulted.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "pending"))]
    Pending,
    /// All test cases passed.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "accepted"))]
    Accepted,
    /// Output did not match expected output.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "wrong_answer"))]
    WrongAnswer,
    /// Exceeded time limit.
    #[serde(rename = "time_limit")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "time_limit"))]
    TimeLimitExceeded,
    /// Program crashed or exited with non-zero code.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "runtime_error"))]
    RuntimeError,
    /// Failed to compile.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "compilation_error"))]
    CompilationError,
    /// The submission could not be judged as configured (e.g. unknown language).
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "system_error"))]
    SystemError,
}

impl SubmissionStatus {
    /// Returns true if this is a final verdict (judging is complete).
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// Returns the stored string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::WrongAnswer => "wrong_answer",
            Self::TimeLimitExceeded => "time_limit",
            Self::RuntimeError => "runtime_error",
            Self::CompilationError => "compilation_error",
            Self::SystemError => "system_error",
        }
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for SubmissionStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Outcome of running a submission against a single test case.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "accepted"))]
    Accepted,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "wrong_answer"))]
    WrongAnswer,
    #[serde(rename = "time_limit")]
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "time_limit"))]
    TimeLimitExceeded,
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "runtime_error"))]
    RuntimeError,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }

    pub fn as_str(&self) -> &'static str {
        SubmissionStatus::from(*self).as_str()
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Verdict> for SubmissionStatus {
    fn from(verdict: Verdict) -> Self {
        match verdict {
            Verdict::Accepted => Self::Accepted,
            Verdict::WrongAnswer => Self::WrongAnswer,
            Verdict::TimeLimitExceeded => Self::TimeLimitExceeded,
            Verdict::RuntimeError => Self::RuntimeError,
        }
    }
}
