//! Judging pipeline: one submission from source to final status.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use common::SubmissionStatus;
use common::judge_job::JudgeJob;
use common::judge_result::{JudgeOutcome, JudgeResult};
use tracing::{debug, info, instrument, warn};

use crate::config::WorkerConfig;
use crate::error::JudgeError;
use crate::language::{CompileError, LanguageRegistry};
use crate::sandbox::{RunLimits, Sandbox, run_test_case};
use crate::store::JudgeStore;
use crate::workspace::Workspace;

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Root under which `submission_<id>` workspaces are created.
    pub work_dir: PathBuf,
    pub compile_timeout: Duration,
    pub enforce_memory_limit: bool,
}

impl From<&WorkerConfig> for PipelineSettings {
    fn from(config: &WorkerConfig) -> Self {
        Self {
            work_dir: config.work_dir.clone(),
            compile_timeout: config.compile_timeout(),
            enforce_memory_limit: config.enforce_memory_limit,
        }
    }
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self::from(&WorkerConfig::default())
    }
}

pub struct JudgePipeline {
    registry: LanguageRegistry,
    sandbox: Arc<dyn Sandbox>,
    store: Arc<dyn JudgeStore>,
    settings: PipelineSettings,
}

impl JudgePipeline {
    pub fn new(
        registry: LanguageRegistry,
        sandbox: Arc<dyn Sandbox>,
        store: Arc<dyn JudgeStore>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            registry,
            sandbox,
            store,
            settings,
        }
    }

    /// Stored status of a submission, `None` if it does not exist.
    pub async fn current_status(
        &self,
        submission_id: i32,
    ) -> Result<Option<SubmissionStatus>, JudgeError> {
        Ok(self.store.submission_status(submission_id).await?)
    }

    /// Judge one submission and write its final status.
    ///
    /// Anything the submitted program does wrong ends up in the returned
    /// outcome (and in the store). An `Err` means the attempt itself failed
    /// and the submission is left as it was.
    #[instrument(skip_all, fields(submission_id = job.submission_id, language = %job.language))]
    pub async fn judge(&self, job: &JudgeJob) -> Result<JudgeOutcome, JudgeError> {
        let submission_id = job.submission_id;

        let adapter = match self.registry.get(&job.language) {
            Ok(adapter) => adapter,
            Err(e) => {
                warn!(error = %e, "Rejecting submission");
                return self
                    .finish(JudgeOutcome::system_error(submission_id, e.to_string()))
                    .await;
            }
        };

        let workspace =
            Workspace::create(&self.settings.work_dir, submission_id).map_err(|source| {
                JudgeError::Workspace {
                    path: Workspace::path_for(&self.settings.work_dir, submission_id),
                    source,
                }
            })?;

        let source_file = adapter.source_file_name();
        workspace
            .write_file(source_file, &job.code)
            .map_err(|source| JudgeError::Workspace {
                path: workspace.path().join(source_file),
                source,
            })?;

        let artifact = match adapter
            .compile(
                self.sandbox.as_ref(),
                workspace.path(),
                self.settings.compile_timeout,
            )
            .await
        {
            Ok(artifact) => artifact,
            Err(CompileError::Failed { diagnostic }) => {
                info!("Compilation failed");
                return self
                    .finish(JudgeOutcome::compilation_error(submission_id, diagnostic))
                    .await;
            }
            Err(CompileError::Sandbox(e)) => return Err(e.into()),
        };

        let test_cases = self.store.load_test_cases(job.problem_id).await?;
        if test_cases.is_empty() {
            warn!(problem_id = job.problem_id, "Problem has no test cases");
            return self
                .finish(JudgeOutcome::system_error(submission_id, "no test cases"))
                .await;
        }

        let invocation = adapter.run_command(workspace.path(), artifact.as_ref());
        let enforce_memory = self.settings.enforce_memory_limit && adapter.limits_address_space();
        let limits = RunLimits {
            time_limit: job.time_limit(),
            address_space_limit: job.memory_limit_bytes().filter(|_| enforce_memory),
        };

        let mut results = Vec::with_capacity(test_cases.len());
        for test_case in &test_cases {
            let run = run_test_case(self.sandbox.as_ref(), &invocation, test_case, &limits).await?;
            debug!(
                test_case_id = test_case.id,
                verdict = %run.verdict,
                time_used = run.time_used_ms,
                "Test case finished"
            );

            let accepted = run.verdict.is_accepted();
            results.push(JudgeResult {
                submission_id,
                test_case_id: test_case.id,
                verdict: run.verdict,
                time_used: run.time_used_ms,
                memory_used: 0,
                error: run.error,
            });
            if !accepted {
                break;
            }
        }
        drop(workspace);

        for result in &results {
            self.store.save_result(result).await?;
        }

        let outcome = JudgeOutcome::from_results(submission_id, results)
            .unwrap_or_else(|| JudgeOutcome::system_error(submission_id, "no test cases"));
        self.finish(outcome).await
    }

    async fn finish(&self, outcome: JudgeOutcome) -> Result<JudgeOutcome, JudgeError> {
        self.store
            .update_submission_status(
                outcome.submission_id,
                outcome.status,
                outcome.time_used,
                outcome.memory_used,
                outcome.error.as_deref(),
            )
            .await?;

        info!(
            status = %outcome.status,
            time_used = outcome.time_used,
            test_cases_run = outcome.results.len(),
            "Submission judged"
        );
        Ok(outcome)
    }
}
