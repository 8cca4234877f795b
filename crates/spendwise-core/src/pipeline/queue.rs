//! Serial processing queue
//!
//! One worker task drains jobs in submission order, so items and corrections
//! queued for the same user never interleave their learning or persistence.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use crate::categorize::LearningOutcome;
use crate::error::{Error, Result};
use crate::models::CategoryLabel;

use super::orchestrator::PipelineOrchestrator;
use super::types::{ProcessingContext, ProcessingResult, RawTransaction};

enum Job {
    Process {
        raw: RawTransaction,
        ctx: ProcessingContext,
        reply: oneshot::Sender<ProcessingResult>,
    },
    Correct {
        user_id: String,
        transaction_id: i64,
        label: CategoryLabel,
        reply: oneshot::Sender<Result<LearningOutcome>>,
    },
}

pub struct ProcessingQueue {
    sender: mpsc::UnboundedSender<Job>,
    pending: Arc<AtomicUsize>,
    worker: JoinHandle<()>,
}

impl ProcessingQueue {
    /// Spawn the worker; must be called inside a tokio runtime
    pub fn start(orchestrator: Arc<PipelineOrchestrator>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let pending = Arc::new(AtomicUsize::new(0));
        let worker_pending = Arc::clone(&pending);

        let worker = tokio::spawn(async move {
            while let Some(job) = receiver.recv().await {
                let delivered = match job {
                    Job::Process { raw, ctx, reply } => {
                        let result = orchestrator.process(&raw, &ctx).await;
                        worker_pending.fetch_sub(1, Ordering::SeqCst);
                        reply.send(result).is_ok()
                    }
                    Job::Correct {
                        user_id,
                        transaction_id,
                        label,
                        reply,
                    } => {
                        let outcome = orchestrator
                            .apply_correction(&user_id, transaction_id, &label)
                            .await;
                        worker_pending.fetch_sub(1, Ordering::SeqCst);
                        reply.send(outcome).is_ok()
                    }
                };
                if !delivered {
                    debug!("Queue caller dropped before reply");
                }
            }
            debug!("Processing queue drained");
        });

        Self {
            sender,
            pending,
            worker,
        }
    }

    /// Queue an item and wait for its result
    pub async fn enqueue(&self, raw: RawTransaction, ctx: ProcessingContext) -> Result<ProcessingResult> {
        let (reply, response) = oneshot::channel();
        self.submit(Job::Process { raw, ctx, reply })?;
        response.await.map_err(|_| Error::QueueClosed)
    }

    /// Queue a correction behind any items already submitted
    pub async fn correct(
        &self,
        user_id: impl Into<String>,
        transaction_id: i64,
        label: CategoryLabel,
    ) -> Result<LearningOutcome> {
        let (reply, response) = oneshot::channel();
        self.submit(Job::Correct {
            user_id: user_id.into(),
            transaction_id,
            label,
            reply,
        })?;
        response.await.map_err(|_| Error::QueueClosed)?
    }

    fn submit(&self, job: Job) -> Result<()> {
        self.pending.fetch_add(1, Ordering::SeqCst);
        if self.sender.send(job).is_err() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            return Err(Error::QueueClosed);
        }
        Ok(())
    }

    /// Jobs submitted but not yet finished
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Stop accepting work and wait for queued jobs to finish
    pub async fn shutdown(self) {
        drop(self.sender);
        if let Err(e) = self.worker.await {
            tracing::warn!("Processing queue worker ended abnormally: {}", e);
        }
    }
}
