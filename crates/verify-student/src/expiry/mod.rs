//! Expiry handling for approved identity verifications.
//!
//! ## Submodules
//!
//! - `selection` - queries and the most-recent-per-user filter
//! - `backfill` - populates `expiry_date`
//! - `notify` - selects and batches learners to email
//! - `dispatch` - sends one batch and stamps `expiry_email_date`
//! - `queue` - runs batches on the async runtime

pub mod backfill;
pub mod dispatch;
pub mod notify;
pub mod queue;
pub mod selection;

pub use backfill::{BackfillParams, BackfillSummary, populate_expiry_date};
pub use dispatch::{BatchOutcome, ExpiryBatch, send_verification_expiry_email};
pub use notify::{ExpiryEmailParams, ExpiryEmailSummary, send_verification_expiry_emails};
pub use queue::{BatchTicket, TaskQueue, TokioTaskQueue};

use std::time::Duration;

/// Throttle between batches to limit load on the database and mail relay.
pub(crate) async fn pause(sleep_time: Duration) {
    if !sleep_time.is_zero() {
        tokio::time::sleep(sleep_time).await;
    }
}
