use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use common::SubmissionStatus;
use common::judge_job::TestCaseData;
use common::judge_result::JudgeResult;

use super::{JudgeStore, StoreError};

/// Verdict fields of a stored submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubmissionRecord {
    pub status: SubmissionStatus,
    pub time_used: i32,
    pub memory_used: i32,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
struct Tables {
    submissions: HashMap<i32, SubmissionRecord>,
    test_cases: HashMap<i32, Vec<TestCaseData>>,
    results: Vec<JudgeResult>,
}

/// In-process store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pending submission.
    pub fn add_submission(&self, submission_id: i32) {
        self.lock()
            .submissions
            .insert(submission_id, SubmissionRecord::default());
    }

    pub fn add_test_cases(&self, problem_id: i32, test_cases: Vec<TestCaseData>) {
        self.lock()
            .test_cases
            .entry(problem_id)
            .or_default()
            .extend(test_cases);
    }

    pub fn submission(&self, submission_id: i32) -> Option<SubmissionRecord> {
        self.lock().submissions.get(&submission_id).cloned()
    }

    /// Results of one submission, in the order they were saved.
    pub fn results(&self, submission_id: i32) -> Vec<JudgeResult> {
        self.lock()
            .results
            .iter()
            .filter(|r| r.submission_id == submission_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        // Nothing panics while holding the lock.
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl JudgeStore for MemoryStore {
    async fn submission_status(
        &self,
        submission_id: i32,
    ) -> Result<Option<SubmissionStatus>, StoreError> {
        Ok(self.lock().submissions.get(&submission_id).map(|s| s.status))
    }

    async fn load_test_cases(&self, problem_id: i32) -> Result<Vec<TestCaseData>, StoreError> {
        Ok(self
            .lock()
            .test_cases
            .get(&problem_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn save_result(&self, result: &JudgeResult) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let duplicate = tables.results.iter().any(|r| {
            r.submission_id == result.submission_id && r.test_case_id == result.test_case_id
        });
        if !duplicate {
            tables.results.push(result.clone());
        }
        Ok(())
    }

    async fn update_submission_status(
        &self,
        submission_id: i32,
        status: SubmissionStatus,
        time_used: i32,
        memory_used: i32,
        error: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock();
        let record = tables
            .submissions
            .get_mut(&submission_id)
            .ok_or(StoreError::SubmissionNotFound(submission_id))?;
        *record = SubmissionRecord {
            status,
            time_used,
            memory_used,
            error: error.map(str::to_string),
        };
        Ok(())
    }
}
