//! One inbound job, at most one concurrent evaluation per submission.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use common::SubmissionStatus;
use common::judge_job::JudgeJob;
use common::judge_result::JudgeOutcome;
use tracing::{error, info, warn};

use crate::pipeline::JudgePipeline;

#[derive(Debug)]
pub enum DispatchOutcome {
    Judged(JudgeOutcome),
    /// The same submission is already being judged by this worker.
    Duplicate,
    /// Redelivery of a submission that already has a final status.
    AlreadyJudged(SubmissionStatus),
    /// No such submission in the store.
    Missing,
    /// Infrastructure fault; the submission keeps its previous status.
    Faulted,
}

/// Routes jobs into the pipeline. Never fails: faults are logged here.
pub struct Dispatcher {
    pipeline: Arc<JudgePipeline>,
    in_flight: Arc<Mutex<HashSet<i32>>>,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<JudgePipeline>) -> Self {
        Self {
            pipeline,
            in_flight: Arc::default(),
        }
    }

    pub async fn dispatch(&self, job: JudgeJob) -> DispatchOutcome {
        let submission_id = job.submission_id;

        let Some(_claim) = InFlightClaim::acquire(&self.in_flight, submission_id) else {
            info!(submission_id, "Submission already in flight, ignoring duplicate");
            return DispatchOutcome::Duplicate;
        };

        match self.pipeline.current_status(submission_id).await {
            Ok(Some(status)) if status.is_final() => {
                info!(submission_id, %status, "Submission already judged, skipping");
                return DispatchOutcome::AlreadyJudged(status);
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(submission_id, "Submission not found, dropping job");
                return DispatchOutcome::Missing;
            }
            Err(e) => {
                error!(submission_id, error = %e, "Failed to read submission status");
                return DispatchOutcome::Faulted;
            }
        }

        match self.pipeline.judge(&job).await {
            Ok(outcome) => DispatchOutcome::Judged(outcome),
            Err(e) => {
                error!(submission_id, error = %e, "Judging failed, submission left pending");
                DispatchOutcome::Faulted
            }
        }
    }
}

/// Holds a submission id in the in-flight set until dropped.
struct InFlightClaim {
    set: Arc<Mutex<HashSet<i32>>>,
    submission_id: i32,
}

impl InFlightClaim {
    fn acquire(set: &Arc<Mutex<HashSet<i32>>>, submission_id: i32) -> Option<Self> {
        let inserted = lock(set).insert(submission_id);
        inserted.then(|| Self {
            set: Arc::clone(set),
            submission_id,
        })
    }
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        lock(&self.set).remove(&self.submission_id);
    }
}

fn lock(set: &Mutex<HashSet<i32>>) -> std::sync::MutexGuard<'_, HashSet<i32>> {
    set.lock().unwrap_or_else(|e| e.into_inner())
}
