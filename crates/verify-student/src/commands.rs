//! Entry points shared by the binary and integration tests.

use std::sync::Arc;
use time::OffsetDateTime;

use crate::AppResources;
use crate::cli::Command;
use crate::email_templates::ExpiryEmailContext;
use crate::error::CommandError;
use crate::expiry::{
    ExpiryEmailParams, TokioTaskQueue, populate_expiry_date, send_verification_expiry_emails,
};

#[tracing::instrument(skip(resources))]
pub async fn run(command: Command, resources: Arc<AppResources>) -> Result<(), CommandError> {
    match command {
        Command::PopulateExpiryDate(args) => {
            let params = args.into_params(resources.config.verify_student.days_good_for);
            populate_expiry_date(resources.db.as_ref(), &params).await?;
        }
        Command::SendVerificationExpiryEmail(args) => {
            let params = ExpiryEmailParams::from(args);
            let email = ExpiryEmailContext::from_config(&resources.config);
            let queue = TokioTaskQueue::new(resources.clone(), email);
            let summary = send_verification_expiry_emails(
                resources.db.as_ref(),
                &queue,
                &params,
                OffsetDateTime::now_utc(),
            )
            .await?;
            if summary.failed_batches > 0 {
                tracing::warn!(
                    name = "commands.send_expiry_email.partial",
                    target = concat!(env!("CARGO_PKG_NAME"), "::", module_path!()),
                    failed_batches = summary.failed_batches,
                    message = "Some expiry email batches did not complete"
                );
            }
        }
    }
    Ok(())
}
