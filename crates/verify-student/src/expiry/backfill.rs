//! Backfill of `expiry_date` for approved verifications.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter};
use std::time::Duration;

use crate::config::MAX_DAYS_GOOD_FOR;
use crate::entity::verification;
use crate::error::CommandError;
use crate::expiry::pause;
use crate::expiry::selection::{LatestPerUser, approved_latest_first};

pub const DEFAULT_BATCH_SIZE: u64 = 1000;
pub const DEFAULT_SLEEP_TIME: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct BackfillParams {
    /// Updates written before pausing.
    pub batch_size: u64,
    pub sleep_time: Duration,
    pub days_good_for: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    pub users_scanned: u64,
    pub records_updated: u64,
    pub pauses: u64,
}

/// Set `expiry_date = updated_at + days_good_for` on every user's most recent
/// approved verification that has none yet.
///
/// Rows that already carry an `expiry_date` are never touched, so the job can
/// be re-run safely. `days_good_for` must lie in `1..=MAX_DAYS_GOOD_FOR`.
#[tracing::instrument(skip(db))]
pub async fn populate_expiry_date(
    db: &DatabaseConnection,
    params: &BackfillParams,
) -> Result<BackfillSummary, CommandError> {
    if !(1..=MAX_DAYS_GOOD_FOR).contains(&params.days_good_for) {
        return Err(CommandError::InvalidArgument(format!(
            "days_good_for must be between 1 and {MAX_DAYS_GOOD_FOR}, got {}",
            params.days_good_for
        )));
    }
    let mut summary = BackfillSummary::default();
    let page_size = params.batch_size.max(1);

    let mut pages = approved_latest_first().paginate(db, page_size);
    if pages.num_items().await? == 0 {
        tracing::info!(
            name = "expiry.backfill.empty",
            target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
            message = "No approved entries found in verification"
        );
        return Ok(summary);
    }

    let good_for = time::Duration::days(params.days_good_for);
    let mut latest = LatestPerUser::new();
    let mut updated_in_batch = 0u64;

    while let Some(rows) = pages.fetch_and_next().await? {
        for record in rows.iter().filter(|r| latest.accept(r)) {
            summary.users_scanned += 1;
            if record.expiry_date.is_some() {
                continue;
            }

            let Some(expiry_date) = record.updated_at.checked_add(good_for) else {
                tracing::warn!(
                    name = "expiry.backfill.out_of_range",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    verification_id = record.id,
                    message = "Expiry date out of range, record left unchanged"
                );
                continue;
            };
            verification::Entity::update_many()
                .col_expr(verification::Column::ExpiryDate, Expr::value(expiry_date))
                .filter(verification::Column::Id.eq(record.id))
                .filter(verification::Column::ExpiryDate.is_null())
                .exec(db)
                .await?;
            summary.records_updated += 1;
            updated_in_batch += 1;

            if updated_in_batch == page_size {
                updated_in_batch = 0;
                summary.pauses += 1;
                tracing::debug!(
                    name = "expiry.backfill.pause",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    updated = summary.records_updated,
                    sleep_secs = params.sleep_time.as_secs(),
                    message = "Batch written, pausing"
                );
                pause(params.sleep_time).await;
            }
        }
    }

    tracing::info!(
        name = "expiry.backfill.done",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        users_scanned = summary.users_scanned,
        records_updated = summary.records_updated,
        message = "Expiry date backfill finished"
    );
    Ok(summary)
}
