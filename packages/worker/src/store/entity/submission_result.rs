use common::Verdict;
use sea_orm::entity::prelude::*;

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "submission_results")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique_key = "submission_test_case")]
    pub submission_id: i32,
    #[sea_orm(unique_key = "submission_test_case")]
    pub test_case_id: i32,

    pub status: Verdict,
    pub time_used: i32,   // ms
    pub memory_used: i32, // KB
    #[sea_orm(column_type = "Text", nullable)]
    pub error: Option<String>,

    #[sea_orm(belongs_to, from = "submission_id", to = "id")]
    pub submission: HasOne<super::submission::Entity>,
    #[sea_orm(belongs_to, from = "test_case_id", to = "id")]
    pub test_case: HasOne<super::test_case::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
