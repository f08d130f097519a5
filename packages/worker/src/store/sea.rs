use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use common::SubmissionStatus;
use common::judge_job::TestCaseData;
use common::judge_result::JudgeResult;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::info;

use super::entity::{submission, submission_result, test_case};
use super::{JudgeStore, StoreError};

/// Store backed by the platform's relational database.
///
/// The schema is owned by the web backend; this side never creates or
/// migrates tables.
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let mut opt = ConnectOptions::new(url.to_owned());
        opt.max_connections(max_connections)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(8))
            .acquire_timeout(Duration::from_secs(8))
            .sqlx_logging(false);

        let db = Database::connect(opt).await?;
        info!(max_connections, "Connected to database");
        Ok(Self::new(db))
    }
}

#[async_trait]
impl JudgeStore for SeaOrmStore {
    async fn submission_status(
        &self,
        submission_id: i32,
    ) -> Result<Option<SubmissionStatus>, StoreError> {
        let found = submission::Entity::find_by_id(submission_id)
            .one(&self.db)
            .await?;
        Ok(found.map(|s| s.status))
    }

    async fn load_test_cases(&self, problem_id: i32) -> Result<Vec<TestCaseData>, StoreError> {
        let rows = test_case::Entity::find()
            .filter(test_case::Column::ProblemId.eq(problem_id))
            .order_by_asc(test_case::Column::Id)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|tc| TestCaseData {
                id: tc.id,
                input: tc.input,
                expected_output: tc.output,
                is_sample: tc.is_sample,
            })
            .collect())
    }

    async fn save_result(&self, result: &JudgeResult) -> Result<(), StoreError> {
        let model = submission_result::ActiveModel {
            submission_id: Set(result.submission_id),
            test_case_id: Set(result.test_case_id),
            status: Set(result.verdict),
            time_used: Set(result.time_used),
            memory_used: Set(result.memory_used),
            error: Set(result.error.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        // A redelivered job may re-save rows an earlier attempt already wrote.
        submission_result::Entity::insert(model)
            .on_conflict(
                OnConflict::columns([
                    submission_result::Column::SubmissionId,
                    submission_result::Column::TestCaseId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await?;
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
        let update = submission::ActiveModel {
            id: Set(submission_id),
            status: Set(status),
            time_used: Set(time_used),
            memory_used: Set(memory_used),
            error: Set(error.map(str::to_string)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };

        match update.update(&self.db).await {
            Ok(_) => Ok(()),
            Err(DbErr::RecordNotUpdated) => Err(StoreError::SubmissionNotFound(submission_id)),
            Err(e) => Err(e.into()),
        }
    }
}
