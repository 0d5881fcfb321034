//! Queries and filters that decide which verification rows a job touches.

use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Select};
use time::{Duration, OffsetDateTime};

use crate::entity::verification::{self, VerificationStatus};

/// All approved verifications, ordered so the first row seen for each user is
/// that user's most recently updated one.
pub fn approved_latest_first() -> Select<verification::Entity> {
    verification::Entity::find()
        .filter(verification::Column::Status.eq(VerificationStatus::Approved))
        .order_by_asc(verification::Column::UserId)
        .order_by_desc(verification::Column::UpdatedAt)
        .order_by_desc(verification::Column::Id)
}

/// Approved verifications with any `expiry_date` strictly between `start` and
/// `now`. Used for the filtered count only; eligibility is decided per user by
/// [`is_expired_within`] on the latest row.
pub fn expired_within(start: OffsetDateTime, now: OffsetDateTime) -> Select<verification::Entity> {
    approved_latest_first()
        .filter(verification::Column::ExpiryDate.lt(now))
        .filter(verification::Column::ExpiryDate.gt(start))
}

/// `now - days_range`, or `None` when that falls outside the representable range.
pub fn range_start(now: OffsetDateTime, days_range: u32) -> Option<OffsetDateTime> {
    now.checked_sub(Duration::days(i64::from(days_range)))
}

/// `now - resend_days`, or `None` when that falls outside the representable range.
pub fn resend_cutoff(now: OffsetDateTime, resend_days: u32) -> Option<OffsetDateTime> {
    now.checked_sub(Duration::days(i64::from(resend_days)))
}

pub fn is_expired_within(
    record: &verification::Model,
    start: OffsetDateTime,
    now: OffsetDateTime,
) -> bool {
    record
        .expiry_date
        .is_some_and(|expiry| expiry > start && expiry < now)
}

/// A record needs an email if none was sent yet, or the last one predates the
/// resend window.
pub fn needs_notification(record: &verification::Model, resend_cutoff: OffsetDateTime) -> bool {
    match record.expiry_email_date {
        None => true,
        Some(sent_at) => sent_at < resend_cutoff,
    }
}

/// Keeps the first row of each user from a stream ordered by
/// [`approved_latest_first`]. Survives page boundaries.
#[derive(Debug, Default)]
pub struct LatestPerUser {
    last_user: Option<i32>,
}

impl LatestPerUser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` when `record` is the most recent row of a user not seen yet.
    pub fn accept(&mut self, record: &verification::Model) -> bool {
        if self.last_user == Some(record.user_id) {
            return false;
        }
        self.last_user = Some(record.user_id);
        true
    }
}
