use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::judge_job::{JudgeJob, TestCaseData};
use tempfile::TempDir;
use worker::sandbox::error::SandboxError;
use worker::sandbox::{Execution, ExecutionRequest, Invocation, Sandbox};
use worker::language::{InterpretedAdapter, NativeAdapter};
use worker::workspace::Workspace;
use worker::{JudgePipeline, LanguageRegistry, MemoryStore, PipelineSettings, ProcessGroupSandbox};

/// Real process sandbox that also records the stdin of every execution.
#[derive(Default)]
pub struct RecordingSandbox {
    inner: ProcessGroupSandbox,
    inputs: Mutex<Vec<Vec<u8>>>,
}

impl RecordingSandbox {
    /// Stdin of each execution so far, compile steps included.
    pub fn inputs(&self) -> Vec<String> {
        self.inputs
            .lock()
            .unwrap()
            .iter()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .collect()
    }
}

#[async_trait]
impl Sandbox for RecordingSandbox {
    async fn execute(
        &self,
        invocation: &Invocation,
        request: &ExecutionRequest<'_>,
    ) -> Result<Execution, SandboxError> {
        self.inputs.lock().unwrap().push(request.stdin.to_vec());
        self.inner.execute(invocation, request).await
    }
}

/// Pipeline over a temp work dir, an in-memory store and `sh`-based languages:
///
/// - `sh`: the source is a shell script run by `sh`.
/// - `sh-compiled`: "compiling" copies the script to the binary path.
/// - `broken`: the compiler always fails with a fixed diagnostic.
/// - `ghost`: the interpreter does not exist.
pub struct TestHarness {
    pub root: TempDir,
    pub store: Arc<MemoryStore>,
    pub sandbox: Arc<RecordingSandbox>,
    pub pipeline: Arc<JudgePipeline>,
    work_dir: PathBuf,
}

pub const BROKEN_DIAGNOSTIC: &str = "main.sh:1:5: error: expected expression\n  x +\n";

impl TestHarness {
    pub fn new() -> Self {
        let root = tempfile::tempdir().unwrap();

        let mut registry = LanguageRegistry::new();
        registry.register(Arc::new(InterpretedAdapter::new("sh", "main.sh", "sh")));
        registry.register(Arc::new(NativeAdapter::new(
            "sh-compiled",
            "main.sh",
            "sh",
            ["-c", r#"cp "$1" "$3" && chmod +x "$3""#, "cc"],
        )));
        registry.register(Arc::new(NativeAdapter::new(
            "broken",
            "main.sh",
            "sh",
            [
                "-c",
                "printf 'main.sh:1:5: error: expected expression\\n  x +\\n' >&2; exit 1",
                "cc",
            ],
        )));
        registry.register(Arc::new(InterpretedAdapter::new(
            "ghost",
            "main.x",
            "/nonexistent/interpreter",
        )));

        let store = Arc::new(MemoryStore::new());
        let sandbox = Arc::new(RecordingSandbox::default());
        let work_dir = root.path().join("work");
        let settings = PipelineSettings {
            work_dir: work_dir.clone(),
            compile_timeout: Duration::from_secs(5),
            enforce_memory_limit: true,
        };
        let pipeline = Arc::new(JudgePipeline::new(
            registry,
            sandbox.clone(),
            store.clone(),
            settings,
        ));

        Self {
            root,
            store,
            sandbox,
            pipeline,
            work_dir,
        }
    }

    pub fn work_dir(&self) -> PathBuf {
        self.work_dir.clone()
    }

    pub fn workspace_path(&self, submission_id: i32) -> PathBuf {
        Workspace::path_for(&self.work_dir(), submission_id)
    }

    /// Register test cases `(input, expected)` for `problem_id`, ids from 1.
    pub fn add_problem(&self, problem_id: i32, cases: &[(&str, &str)]) {
        let cases = cases
            .iter()
            .enumerate()
            .map(|(i, (input, expected))| TestCaseData {
                id: problem_id * 100 + i as i32 + 1,
                input: input.to_string(),
                expected_output: expected.to_string(),
                is_sample: i == 0,
            })
            .collect();
        self.store.add_test_cases(problem_id, cases);
    }

    /// A pending submission in the store plus the job that would judge it.
    pub fn submit(&self, submission_id: i32, problem_id: i32, language: &str, code: &str) -> JudgeJob {
        self.store.add_submission(submission_id);
        JudgeJob {
            submission_id,
            user_id: 1,
            problem_id,
            contest_id: None,
            language: language.to_string(),
            code: code.to_string(),
            time_limit: 1000,
            memory_limit: 256,
        }
    }
}

/// Whether `pid` has exited, waiting up to two seconds for it to be reaped.
pub async fn process_gone(pid: i32) -> bool {
    for _ in 0..40 {
        match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
            Err(_) => return true,
            // Killed but not yet reaped by its new parent.
            Ok(stat) if stat.rsplit(')').next().is_some_and(|s| s.trim_start().starts_with('Z')) => {
                return true;
            }
            Ok(_) => tokio::time::sleep(Duration::from_millis(50)).await,
        }
    }
    false
}
