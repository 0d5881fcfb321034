//! Sending the expiry email for one batch of verifications.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use time::OffsetDateTime;

use crate::email_templates::ExpiryEmailContext;
use crate::entity::{user, verification};
use crate::mail::EmailSender;

/// A group of verifications handed to the task queue together.
#[derive(Clone, Debug)]
pub struct ExpiryBatch {
    pub index: usize,
    pub verifications: Vec<verification::Model>,
}

impl ExpiryBatch {
    pub fn len(&self) -> usize {
        self.verifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.verifications.is_empty()
    }

    /// User ids of the first and last record; rows are ordered by user id.
    pub fn user_id_range(&self) -> Option<(i32, i32)> {
        let first = self.verifications.first()?;
        let last = self.verifications.last()?;
        Some((first.user_id, last.user_id))
    }
}

/// Per-batch result: verification ids stamped and ids left for a later run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub batch: usize,
    pub sent: Vec<i32>,
    pub failed: Vec<i32>,
}

/// Email every learner in `batch` and stamp `expiry_email_date` on success.
///
/// Failures are logged per record and never abort the batch; an unstamped
/// record qualifies again on the next run.
#[tracing::instrument(skip_all, fields(batch = batch.index, size = batch.len()))]
pub async fn send_verification_expiry_email(
    db: &DatabaseConnection,
    mailer: &dyn EmailSender,
    email: &ExpiryEmailContext,
    batch: ExpiryBatch,
) -> BatchOutcome {
    let mut outcome = BatchOutcome {
        batch: batch.index,
        ..BatchOutcome::default()
    };
    let subject = email.subject();

    for record in batch.verifications {
        let learner = match user::Entity::find_by_id(record.user_id).one(db).await {
            Ok(Some(learner)) => learner,
            Ok(None) => {
                tracing::error!(
                    name = "expiry.dispatch.user_missing",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    user_id = record.user_id,
                    verification_id = record.id,
                    message = "No user found for verification"
                );
                outcome.failed.push(record.id);
                continue;
            }
            Err(e) => {
                tracing::error!(
                    name = "expiry.dispatch.user_lookup_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    user_id = record.user_id,
                    message = "Failed to load user"
                );
                outcome.failed.push(record.id);
                continue;
            }
        };

        let body = email.for_learner(&learner.full_name).render_text();
        if let Err(e) = mailer
            .send(&email.from_address, &learner.email, &subject, &body)
            .await
        {
            if e.is_transport() {
                tracing::warn!(
                    name = "expiry.dispatch.send_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    user_id = record.user_id,
                    message = "Failure in sending verification expiry e-mail"
                );
            } else {
                tracing::error!(
                    name = "expiry.dispatch.message_invalid",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    user_id = record.user_id,
                    message = "Could not build verification expiry e-mail"
                );
            }
            outcome.failed.push(record.id);
            continue;
        }

        let stamped = verification::Entity::update_many()
            .col_expr(
                verification::Column::ExpiryEmailDate,
                Expr::value(OffsetDateTime::now_utc()),
            )
            .filter(verification::Column::Id.eq(record.id))
            .exec(db)
            .await;
        match stamped {
            Ok(_) => outcome.sent.push(record.id),
            Err(e) => {
                tracing::error!(
                    name = "expiry.dispatch.stamp_failed",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    error = %e,
                    verification_id = record.id,
                    message = "Email sent but expiry_email_date could not be recorded"
                );
                outcome.failed.push(record.id);
            }
        }
    }

    tracing::info!(
        name = "expiry.dispatch.batch_done",
        target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
        batch = outcome.batch,
        sent = outcome.sent.len(),
        failed = outcome.failed.len(),
        message = "Expiry email batch processed"
    );
    outcome
}
