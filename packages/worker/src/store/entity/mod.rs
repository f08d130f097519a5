pub mod submission;
pub mod submission_result;
pub mod test_case;
