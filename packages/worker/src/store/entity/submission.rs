use common::SubmissionStatus;
use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub user_id: i32,
    pub problem_id: i32,
    /// NULL for practice submissions.
    pub contest_id: Option<i32>,

    pub language: String,
    #[sea_orm(column_type = "Text")]
    pub code: String,

    pub status: SubmissionStatus,
    pub time_used: i32,   // ms
    pub memory_used: i32, // KB
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,

    #[sea_orm(has_many)]
    pub results: HasMany<super::submission_result::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
