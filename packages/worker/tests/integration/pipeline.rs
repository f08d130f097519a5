use std::time::{Duration, Instant};

use common::{SubmissionStatus, Verdict};
use worker::JudgeError;

use crate::harness::{BROKEN_DIAGNOSTIC, TestHarness, process_gone};

const SUM: &str = "read a b\necho $((a + b))\n";

mod verdicts {
    use super::*;

    #[tokio::test]
    async fn interpreted_submission_is_accepted() {
        let h = TestHarness::new();
        h.add_problem(1, &[("3 4\n", "7\n")]);
        let job = h.submit(10, 1, "sh", SUM);

        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert_eq!(outcome.status, SubmissionStatus::Accepted);
        assert_eq!(outcome.results.len(), 1);
        assert_eq!(outcome.results[0].verdict, Verdict::Accepted);
        assert_eq!(outcome.results[0].test_case_id, 101);

        let stored = h.store.submission(10).unwrap();
        assert_eq!(stored.status, SubmissionStatus::Accepted);
        assert_eq!(stored.error, None);
        assert_eq!(h.store.results(10), outcome.results);
    }

    #[tokio::test]
    async fn trailing_newline_is_wrong_answer() {
        let h = TestHarness::new();
        h.add_problem(1, &[("3 4\n", "7\n")]);
        let job = h.submit(11, 1, "sh", "read a b\nprintf '%s' $((a + b))\n");

        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert_eq!(outcome.status, SubmissionStatus::WrongAnswer);
        assert_eq!(
            outcome.error.as_deref(),
            Some("Output does not match expected output")
        );
    }

    #[tokio::test]
    async fn runtime_error_keeps_stderr() {
        let h = TestHarness::new();
        h.add_problem(1, &[("3 4\n", "7\n")]);
        let job = h.submit(12, 1, "sh", "echo 'division by zero' >&2\nexit 3\n");

        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert_eq!(outcome.status, SubmissionStatus::RuntimeError);
        assert_eq!(outcome.error.as_deref(), Some("division by zero\n"));
        assert_eq!(
            h.store.submission(12).unwrap().error.as_deref(),
            Some("division by zero\n")
        );
    }

    #[tokio::test]
    async fn compiled_submission_runs_its_artifact() {
        let h = TestHarness::new();
        h.add_problem(2, &[("3 4\n", "12\n"), ("5 6\n", "30\n")]);
        let job = h.submit(13, 2, "sh-compiled", "#!/bin/sh\nread a b\necho $((a * b))\n");

        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert_eq!(outcome.status, SubmissionStatus::Accepted);
        assert_eq!(outcome.results.len(), 2);
        // Compile step first, with empty stdin.
        assert_eq!(h.sandbox.inputs(), ["", "3 4\n", "5 6\n"]);
    }
}

mod early_exit {
    use super::*;

    #[tokio::test]
    async fn stops_at_first_failing_case() {
        let h = TestHarness::new();
        h.add_problem(3, &[("a\n", "a\n"), ("b\n", "b\n"), ("c\n", "c\n")]);
        let code = "read x\nif [ \"$x\" = b ]; then echo wrong; else echo \"$x\"; fi\n";
        let job = h.submit(20, 3, "sh", code);

        let outcome = h.pipeline.judge(&job).await.unwrap();

        let verdicts: Vec<_> = h.store.results(20).iter().map(|r| r.verdict).collect();
        assert_eq!(verdicts, [Verdict::Accepted, Verdict::WrongAnswer]);
        assert_eq!(h.sandbox.inputs(), ["a\n", "b\n"]);
        assert_eq!(outcome.status, SubmissionStatus::WrongAnswer);
        assert_eq!(outcome.results.last().unwrap().test_case_id, 302);
    }

    #[tokio::test]
    async fn submission_takes_numbers_from_last_result() {
        let h = TestHarness::new();
        h.add_problem(3, &[("1\n", "1\n"), ("2\n", "2\n")]);
        let code = "read x\nif [ \"$x\" = 1 ]; then sleep 0.3; fi\necho \"$x\"\n";
        let job = h.submit(21, 3, "sh", code);

        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert_eq!(outcome.status, SubmissionStatus::Accepted);
        assert!(outcome.results[0].time_used >= 300);
        assert_eq!(outcome.time_used, outcome.results[1].time_used);
        assert_eq!(h.store.submission(21).unwrap().time_used, outcome.time_used);
    }
}

mod time_limit {
    use super::*;

    #[tokio::test]
    async fn endless_loop_is_killed_at_the_limit() {
        let h = TestHarness::new();
        h.add_problem(4, &[("", "")]);
        let job = h.submit(30, 4, "sh", "trap '' TERM INT\nwhile :; do :; done\n");

        let start = Instant::now();
        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert!(start.elapsed() < Duration::from_secs(4));
        assert_eq!(outcome.status, SubmissionStatus::TimeLimitExceeded);
        assert_eq!(outcome.time_used, 1000);
        assert_eq!(outcome.results[0].time_used, 1000);
        assert_eq!(outcome.error.as_deref(), Some("Time limit exceeded"));
    }

    #[tokio::test]
    async fn children_do_not_outlive_the_run() {
        let h = TestHarness::new();
        h.add_problem(4, &[("", "")]);
        let pid_file = h.root.path().join("child.pid");
        let code = format!(
            "sleep 300 &\necho $! > '{}'\nwhile :; do :; done\n",
            pid_file.display()
        );
        let job = h.submit(31, 4, "sh", &code);

        let outcome = h.pipeline.judge(&job).await.unwrap();
        assert_eq!(outcome.status, SubmissionStatus::TimeLimitExceeded);

        let pid: i32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        assert!(process_gone(pid).await, "background child {pid} survived");
    }
}

mod failures {
    use super::*;

    #[tokio::test]
    async fn compile_failure_records_diagnostic_verbatim() {
        let h = TestHarness::new();
        h.add_problem(5, &[("3 4\n", "7\n")]);
        let job = h.submit(40, 5, "broken", SUM);

        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert_eq!(outcome.status, SubmissionStatus::CompilationError);
        assert_eq!(outcome.error.as_deref(), Some(BROKEN_DIAGNOSTIC));
        assert!(outcome.results.is_empty());
        assert!(h.store.results(40).is_empty());
        // Only the compiler ran.
        assert_eq!(h.sandbox.inputs().len(), 1);

        let stored = h.store.submission(40).unwrap();
        assert_eq!(stored.status, SubmissionStatus::CompilationError);
        assert_eq!(stored.error.as_deref(), Some(BROKEN_DIAGNOSTIC));
    }

    #[tokio::test]
    async fn unsupported_language_creates_nothing() {
        let h = TestHarness::new();
        h.add_problem(5, &[("3 4\n", "7\n")]);
        let job = h.submit(41, 5, "cobol", SUM);

        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert_eq!(outcome.status, SubmissionStatus::SystemError);
        assert_eq!(outcome.error.as_deref(), Some("unsupported language: cobol"));
        assert!(!h.work_dir().exists());
        assert!(h.sandbox.inputs().is_empty());
        assert!(h.store.results(41).is_empty());
        assert_eq!(
            h.store.submission(41).unwrap().status,
            SubmissionStatus::SystemError
        );
    }

    #[tokio::test]
    async fn problem_without_test_cases_is_a_system_error() {
        let h = TestHarness::new();
        let job = h.submit(42, 99, "sh", SUM);

        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert_eq!(outcome.status, SubmissionStatus::SystemError);
        assert_eq!(outcome.error.as_deref(), Some("no test cases"));
        assert!(!h.workspace_path(42).exists());
    }

    #[tokio::test]
    async fn spawn_failure_leaves_submission_pending() {
        let h = TestHarness::new();
        h.add_problem(5, &[("3 4\n", "7\n")]);
        let job = h.submit(43, 5, "ghost", SUM);

        let err = h.pipeline.judge(&job).await.unwrap_err();

        assert!(matches!(err, JudgeError::Sandbox(_)), "got {err:?}");
        assert_eq!(h.store.submission(43).unwrap().status, SubmissionStatus::Pending);
        assert!(h.store.results(43).is_empty());
        assert!(!h.workspace_path(43).exists());
    }
}

mod workspace {
    use super::*;

    #[tokio::test]
    async fn workspace_is_removed_after_every_outcome() {
        let h = TestHarness::new();
        h.add_problem(6, &[("3 4\n", "7\n")]);

        let cases = [
            (50, "sh", SUM),
            (51, "sh", "exit 1\n"),
            (52, "sh", "while :; do :; done\n"),
            (53, "broken", SUM),
        ];
        for (id, language, code) in cases {
            let job = h.submit(id, 6, language, code);
            h.pipeline.judge(&job).await.unwrap();
            assert!(!h.workspace_path(id).exists(), "workspace {id} left behind");
        }
        assert_eq!(std::fs::read_dir(h.work_dir()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn stale_workspace_from_crashed_attempt_is_replaced() {
        let h = TestHarness::new();
        h.add_problem(6, &[("3 4\n", "7\n")]);
        let stale = h.workspace_path(54);
        std::fs::create_dir_all(&stale).unwrap();
        std::fs::write(stale.join("main.sh"), "echo stale\n").unwrap();

        let job = h.submit(54, 6, "sh", SUM);
        let outcome = h.pipeline.judge(&job).await.unwrap();

        assert_eq!(outcome.status, SubmissionStatus::Accepted);
        assert!(!stale.exists());
    }
}
