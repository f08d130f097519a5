use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub use common::config::MqAppConfig;

use crate::error::Result;

/// Worker-specific configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct WorkerConfig {
    /// Unique identifier for this worker instance. Default: "worker-1".
    #[serde(default = "default_worker_id")]
    pub id: String,
    /// Number of submissions judged concurrently. Default: 1.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Root under which per-submission workspaces are created.
    /// Default: "<tmp>/onlinejudge".
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,
    /// Wall-clock limit for a compile step in milliseconds. Default: 30000.
    #[serde(default = "default_compile_timeout_ms")]
    pub compile_timeout_ms: u64,
    /// Upper bound on kill + reap + pipe drain after a run ends. Default: 2000.
    #[serde(default = "default_kill_grace_ms")]
    pub kill_grace_ms: u64,
    /// Captured bytes per stream; the rest is drained and dropped. Default: 64 MiB.
    #[serde(default = "default_max_output_bytes")]
    pub max_output_bytes: usize,
    /// Apply the problem memory limit as RLIMIT_AS where the language allows it.
    /// Default: true.
    #[serde(default = "default_enforce_memory_limit")]
    pub enforce_memory_limit: bool,
}

fn default_worker_id() -> String {
    "worker-1".into()
}
fn default_concurrency() -> usize {
    1
}
fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("onlinejudge")
}
fn default_compile_timeout_ms() -> u64 {
    30_000
}
fn default_kill_grace_ms() -> u64 {
    2_000
}
fn default_max_output_bytes() -> usize {
    64 * 1024 * 1024
}
fn default_enforce_memory_limit() -> bool {
    true
}

impl WorkerConfig {
    pub fn compile_timeout(&self) -> Duration {
        Duration::from_millis(self.compile_timeout_ms)
    }

    pub fn kill_grace(&self) -> Duration {
        Duration::from_millis(self.kill_grace_ms)
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            id: default_worker_id(),
            concurrency: default_concurrency(),
            work_dir: default_work_dir(),
            compile_timeout_ms: default_compile_timeout_ms(),
            kill_grace_ms: default_kill_grace_ms(),
            max_output_bytes: default_max_output_bytes(),
            enforce_memory_limit: default_enforce_memory_limit(),
        }
    }
}

/// External compiler and interpreter binaries.
#[derive(Debug, Deserialize, Clone)]
pub struct ToolchainConfig {
    #[serde(default = "default_cxx")]
    pub cxx: String,
    #[serde(default = "default_cc")]
    pub cc: String,
    #[serde(default = "default_javac")]
    pub javac: String,
    #[serde(default = "default_java")]
    pub java: String,
    #[serde(default = "default_python")]
    pub python: String,
}

fn default_cxx() -> String {
    "g++".into()
}
fn default_cc() -> String {
    "gcc".into()
}
fn default_javac() -> String {
    "javac".into()
}
fn default_java() -> String {
    "java".into()
}
fn default_python() -> String {
    "python3".into()
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            cxx: default_cxx(),
            cc: default_cc(),
            javac: default_javac(),
            java: default_java(),
            python: default_python(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Default: "postgres://localhost/onlinejudge".
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Pool size. Default: 5.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "postgres://localhost/onlinejudge".into()
}
fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}

/// Worker application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct WorkerAppConfig {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
}

impl WorkerAppConfig {
    /// Load from `$JUDGE_CONFIG` (default `config/config`), then `JUDGE__*` env vars.
    pub fn load() -> Result<Self> {
        let config_path =
            std::env::var("JUDGE_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("worker.id", "worker-1")?
            .set_default("worker.concurrency", 1_i64)?
            .set_default("mq.url", "redis://localhost:6379")?
            .set_default("mq.pool_size", 5_i64)?
            .set_default("mq.queue_name", "submission.evaluate")?
            .add_source(File::with_name(&config_path).required(false))
            .add_source(Environment::with_prefix("JUDGE").separator("__"))
            .build()?;

        Ok(s.try_deserialize()?)
    }
}
