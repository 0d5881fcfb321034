//! Selection and batching of learners whose verification has expired.

use sea_orm::{DatabaseConnection, PaginatorTrait};
use std::time::Duration;
use time::OffsetDateTime;

use crate::entity::verification;
use crate::error::{CommandError, QueueError};
use crate::expiry::dispatch::{BatchOutcome, ExpiryBatch};
use crate::expiry::pause;
use crate::expiry::queue::TaskQueue;
use crate::expiry::selection::{
    LatestPerUser, approved_latest_first, expired_within, is_expired_within, needs_notification,
    range_start, resend_cutoff,
};

pub const DEFAULT_RESEND_DAYS: u32 = 15;
pub const DEFAULT_DAYS_RANGE: u32 = 365;

#[derive(Clone, Debug)]
pub struct ExpiryEmailParams {
    pub resend_days: u32,
    /// Maximum verifications per queued batch.
    pub batch_size: u64,
    pub sleep_time: Duration,
    pub days_range: u32,
    pub dry_run: bool,
}

impl Default for ExpiryEmailParams {
    fn default() -> Self {
        Self {
            resend_days: DEFAULT_RESEND_DAYS,
            batch_size: crate::expiry::backfill::DEFAULT_BATCH_SIZE,
            sleep_time: crate::expiry::backfill::DEFAULT_SLEEP_TIME,
            days_range: DEFAULT_DAYS_RANGE,
            dry_run: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ExpiryEmailSummary {
    /// Approved rows with an expiry date inside the range, before grouping per user.
    pub filtered: u64,
    pub qualifying: u64,
    pub batches_dispatched: usize,
    /// First and last user id of every batch a dry run would have sent.
    pub dry_run_ranges: Vec<(i32, i32)>,
    pub emails_sent: usize,
    pub emails_failed: usize,
    pub failed_batches: usize,
}

impl ExpiryEmailSummary {
    fn record(&mut self, outcome: Result<BatchOutcome, QueueError>) {
        match outcome {
            Ok(outcome) => {
                self.emails_sent += outcome.sent.len();
                self.emails_failed += outcome.failed.len();
            }
            Err(e) => {
                tracing::error!(
                    name = "expiry.notify.batch_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    message = "Expiry email batch did not complete"
                );
                self.failed_batches += 1;
            }
        }
    }
}

struct Batcher<'a> {
    queue: &'a dyn TaskQueue,
    params: &'a ExpiryEmailParams,
    current: Vec<verification::Model>,
    summary: ExpiryEmailSummary,
}

impl Batcher<'_> {
    async fn push(&mut self, record: verification::Model) -> Result<(), QueueError> {
        self.current.push(record);
        self.summary.qualifying += 1;
        if self.current.len() as u64 >= self.params.batch_size {
            self.flush().await?;
        }
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), QueueError> {
        if self.current.is_empty() {
            return Ok(());
        }
        let index = self.summary.batches_dispatched + self.summary.dry_run_ranges.len();
        let batch = ExpiryBatch {
            index,
            verifications: std::mem::take(&mut self.current),
        };

        if self.params.dry_run {
            if let Some((first, last)) = batch.user_id_range() {
                tracing::info!(
                    name = "expiry.notify.dry_run",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    first_user_id = first,
                    last_user_id = last,
                    "This was a dry run, no email was sent. For the actual run email would have been sent for expired verification within the range: user id {first} - user id {last}"
                );
                self.summary.dry_run_ranges.push((first, last));
            }
            return Ok(());
        }

        if self.summary.batches_dispatched > 0 {
            pause(self.params.sleep_time).await;
        }
        let ticket = self.queue.enqueue(batch).await?;
        tracing::debug!(
            name = "expiry.notify.enqueued",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            batch = ticket.batch,
            size = ticket.size,
            message = "Expiry email batch queued"
        );
        self.summary.batches_dispatched += 1;
        Ok(())
    }
}

/// Queue expiry emails for every learner whose most recent approved
/// verification expired within `params.days_range` days before `now` and who
/// was not emailed during the last `params.resend_days` days.
///
/// Batches hold at most `params.batch_size` verifications; the last one may be
/// smaller. Every queued batch is awaited before returning.
#[tracing::instrument(skip(db, queue))]
pub async fn send_verification_expiry_emails(
    db: &DatabaseConnection,
    queue: &dyn TaskQueue,
    params: &ExpiryEmailParams,
    now: OffsetDateTime,
) -> Result<ExpiryEmailSummary, CommandError> {
    if params.batch_size == 0 {
        return Err(CommandError::InvalidArgument(
            "batch size must be at least 1".into(),
        ));
    }
    let start = range_start(now, params.days_range).ok_or_else(|| {
        CommandError::InvalidArgument(format!(
            "days range {} reaches past the earliest supported date",
            params.days_range
        ))
    })?;
    let cutoff = resend_cutoff(now, params.resend_days).ok_or_else(|| {
        CommandError::InvalidArgument(format!(
            "resend days {} reaches past the earliest supported date",
            params.resend_days
        ))
    })?;

    let filtered = expired_within(start, now).count(db).await?;
    if filtered == 0 {
        tracing::info!(
            name = "expiry.notify.empty",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            "No approved expired entries found in verification for the date range {} - {}",
            start.date(),
            now.date()
        );
        return Ok(ExpiryEmailSummary::default());
    }
    tracing::info!(
        name = "expiry.notify.filtered",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        "For the date range {} - {}, total verifications filtered are {}",
        start.date(),
        now.date(),
        filtered
    );

    let mut pages = approved_latest_first().paginate(db, params.batch_size);
    let mut latest = LatestPerUser::new();
    let mut batcher = Batcher {
        queue,
        params,
        current: Vec::new(),
        summary: ExpiryEmailSummary {
            filtered,
            ..ExpiryEmailSummary::default()
        },
    };

    let window = Window { start, now, cutoff };
    let scanned = scan_and_queue(&mut pages, &mut latest, &mut batcher, &window).await;
    let mut summary = batcher.summary;
    if !params.dry_run {
        for outcome in queue.drain().await {
            summary.record(outcome);
        }
    }
    scanned?;

    tracing::info!(
        name = "expiry.notify.done",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        qualifying = summary.qualifying,
        batches = summary.batches_dispatched,
        sent = summary.emails_sent,
        failed = summary.emails_failed,
        dry_run = params.dry_run,
        message = "Verification expiry email run finished"
    );
    Ok(summary)
}

struct Window {
    start: OffsetDateTime,
    now: OffsetDateTime,
    cutoff: OffsetDateTime,
}

/// Only a user's most recent approved row decides eligibility; an older
/// expired row behind a newer valid one is never emailed.
async fn scan_and_queue(
    pages: &mut sea_orm::Paginator<'_, DatabaseConnection, sea_orm::SelectModel<verification::Model>>,
    latest: &mut LatestPerUser,
    batcher: &mut Batcher<'_>,
    window: &Window,
) -> Result<(), CommandError> {
    while let Some(rows) = pages.fetch_and_next().await? {
        for record in rows {
            if latest.accept(&record)
                && is_expired_within(&record, window.start, window.now)
                && needs_notification(&record, window.cutoff)
            {
                batcher.push(record).await?;
            }
        }
    }
    batcher.flush().await?;
    Ok(())
}
