use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use worker::{
    Dispatcher, JudgePipeline, LanguageRegistry, PipelineSettings, ProcessGroupSandbox,
    SeaOrmStore, WorkerAppConfig, intake,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = WorkerAppConfig::load().context("Failed to load config")?;
    info!("Worker starting: {}", config.worker.id);

    std::fs::create_dir_all(&config.worker.work_dir).with_context(|| {
        format!(
            "Failed to create work dir {}",
            config.worker.work_dir.display()
        )
    })?;

    let store = SeaOrmStore::connect(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")?;

    let registry = LanguageRegistry::with_defaults(&config.toolchain);
    info!(languages = ?registry.languages(), "Languages registered");

    let sandbox = ProcessGroupSandbox::new(
        config.worker.kill_grace(),
        config.worker.max_output_bytes,
    );
    let pipeline = JudgePipeline::new(
        registry,
        Arc::new(sandbox),
        Arc::new(store),
        PipelineSettings::from(&config.worker),
    );
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(pipeline)));

    let queue = intake::connect(&config.mq)
        .await
        .context("Failed to initialize MQ")?;
    info!(queue_name = %config.mq.queue_name, "MQ connected");

    if let Err(e) = intake::run(
        &queue,
        &config.mq.queue_name,
        config.worker.concurrency.max(1),
        dispatcher,
    )
    .await
    {
        error!(error = %e, "Worker stopped unexpectedly");
    }

    Ok(())
}
