//! Persistence collaborator.
//!
//! The judging engine reads test cases and writes exactly two things: the
//! per-test-case results and the verdict fields of the submission itself.

pub mod entity;
pub mod memory;
pub mod sea;

use async_trait::async_trait;
use common::SubmissionStatus;
use common::judge_job::TestCaseData;
use common::judge_result::JudgeResult;
use thiserror::Error;

pub use memory::MemoryStore;
pub use sea::SeaOrmStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("submission {0} not found")]
    SubmissionNotFound(i32),
}

#[async_trait]
pub trait JudgeStore: Send + Sync {
    /// Current status, or `None` if the submission does not exist.
    async fn submission_status(
        &self,
        submission_id: i32,
    ) -> Result<Option<SubmissionStatus>, StoreError>;

    /// All test cases of a problem, in evaluation order.
    async fn load_test_cases(&self, problem_id: i32) -> Result<Vec<TestCaseData>, StoreError>;

    /// Append one result. Saving the same (submission, test case) pair twice is a no-op.
    async fn save_result(&self, result: &JudgeResult) -> Result<(), StoreError>;

    async fn update_submission_status(
        &self,
        submission_id: i32,
        status: SubmissionStatus,
        time_used: i32,
        memory_used: i32,
        error: Option<&str>,
    ) -> Result<(), StoreError>;
}
