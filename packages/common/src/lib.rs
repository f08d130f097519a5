pub mod config;
pub mod judge_job;
pub mod judge_result;
pub mod submission_status;

pub use submission_status::{SubmissionStatus, Verdict};
