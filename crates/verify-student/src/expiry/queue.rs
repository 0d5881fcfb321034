//! Task queue that runs expiry email batches on the tokio runtime.
//!
//! `enqueue` acknowledges a batch once its task is spawned; `drain` waits for
//! every accepted batch and reports what happened to it.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::AppResources;
use crate::email_templates::ExpiryEmailContext;
use crate::error::QueueError;
use crate::expiry::dispatch::{BatchOutcome, ExpiryBatch, send_verification_expiry_email};

/// Acknowledgement for an accepted batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatchTicket {
    pub batch: usize,
    pub size: usize,
}

#[async_trait]
pub trait TaskQueue: Send + Sync {
    async fn enqueue(&self, batch: ExpiryBatch) -> Result<BatchTicket, QueueError>;

    /// Close the queue and wait for every accepted batch.
    async fn drain(&self) -> Vec<Result<BatchOutcome, QueueError>>;
}

#[derive(Default)]
struct Pending {
    closed: bool,
    handles: Vec<(usize, JoinHandle<BatchOutcome>)>,
}

pub struct TokioTaskQueue {
    resources: Arc<AppResources>,
    email: Arc<ExpiryEmailContext>,
    /// The closed flag shares the lock with the handles so a batch is either
    /// drained or rejected, never dropped.
    pending: Mutex<Pending>,
}

impl TokioTaskQueue {
    pub fn new(resources: Arc<AppResources>, email: ExpiryEmailContext) -> Self {
        Self {
            resources,
            email: Arc::new(email),
            pending: Mutex::new(Pending::default()),
        }
    }
}

#[async_trait]
impl TaskQueue for TokioTaskQueue {
    async fn enqueue(&self, batch: ExpiryBatch) -> Result<BatchTicket, QueueError> {
        let mut pending = self.pending.lock().await;
        if pending.closed {
            return Err(QueueError::Closed);
        }
        let ticket = BatchTicket {
            batch: batch.index,
            size: batch.len(),
        };

        let resources = self.resources.clone();
        let email = self.email.clone();
        let handle = tokio::spawn(async move {
            send_verification_expiry_email(
                resources.db.as_ref(),
                resources.mailer.as_ref(),
                email.as_ref(),
                batch,
            )
            .await
        });
        pending.handles.push((ticket.batch, handle));
        Ok(ticket)
    }

    async fn drain(&self) -> Vec<Result<BatchOutcome, QueueError>> {
        let pending = {
            let mut pending = self.pending.lock().await;
            pending.closed = true;
            std::mem::take(&mut pending.handles)
        };

        let mut outcomes = Vec::with_capacity(pending.len());
        for (batch, handle) in pending {
            outcomes.push(handle.await.map_err(|e| QueueError::Join {
                batch,
                reason: e.to_string(),
            }));
        }
        outcomes
    }
}
