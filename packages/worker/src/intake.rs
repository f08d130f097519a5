//! Queue consumption.

use std::sync::Arc;

use broccoli_queue::brokers::broker::BrokerMessage;
use broccoli_queue::error::BroccoliError;
use broccoli_queue::queue::BroccoliQueue;
use common::config::MqAppConfig;
use common::judge_job::JudgeJob;
use tracing::{error, info, warn};

use crate::dispatch::{DispatchOutcome, Dispatcher};
use crate::error::Result;

pub async fn connect(config: &MqAppConfig) -> Result<BroccoliQueue> {
    let queue = BroccoliQueue::builder(&config.url)
        .pool_connections(config.pool_size)
        .build()
        .await?;
    Ok(queue)
}

/// Consume submission-evaluation requests until the broker connection ends.
///
/// Every message is acknowledged: malformed payloads and judging faults are
/// logged and dropped. Redelivery is up to whoever republishes the request.
pub async fn run(
    queue: &BroccoliQueue,
    queue_name: &str,
    concurrency: usize,
    dispatcher: Arc<Dispatcher>,
) -> Result<()> {
    info!(queue = %queue_name, concurrency, "Consuming submissions");

    queue
        .process_messages(
            queue_name,
            Some(concurrency),
            None,
            move |message: BrokerMessage<serde_json::Value>| {
                let dispatcher = Arc::clone(&dispatcher);
                async move {
                    handle_message(&dispatcher, message.payload).await;
                    Ok::<(), BroccoliError>(())
                }
            },
        )
        .await?;
    Ok(())
}

async fn handle_message(dispatcher: &Dispatcher, payload: serde_json::Value) {
    let job = match parse_job(payload) {
        Ok(job) => job,
        Err(e) => {
            error!(error = %e, "Failed to parse submission, dropping message");
            return;
        }
    };

    let submission_id = job.submission_id;
    if let DispatchOutcome::Faulted = dispatcher.dispatch(job).await {
        warn!(submission_id, "Message acknowledged without a verdict");
    }
}

pub fn parse_job(payload: serde_json::Value) -> serde_json::Result<JudgeJob> {
    serde_json::from_value(payload)
}
