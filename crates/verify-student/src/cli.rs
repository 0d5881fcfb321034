use clap::{Args, Parser, Subcommand};
use std::time::Duration;

use crate::expiry::backfill::{BackfillParams, DEFAULT_BATCH_SIZE, DEFAULT_SLEEP_TIME};
use crate::expiry::notify::{DEFAULT_DAYS_RANGE, DEFAULT_RESEND_DAYS, ExpiryEmailParams};

const DEFAULT_SLEEP_SECS: u64 = DEFAULT_SLEEP_TIME.as_secs();

#[derive(Debug, Parser)]
#[command(
    name = "verify-student",
    about = "Maintenance jobs for identity-verification expiry"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Populate expiry_date for approved verifications.
    PopulateExpiryDate(PopulateExpiryDateArgs),
    /// Email learners whose verification has expired.
    SendVerificationExpiryEmail(SendVerificationExpiryEmailArgs),
}

#[derive(Debug, Args)]
pub struct PopulateExpiryDateArgs {
    /// Maximum number of rows updated before pausing.
    #[arg(
        long = "batch_size",
        visible_alias = "batch-size",
        default_value_t = DEFAULT_BATCH_SIZE,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub batch_size: u64,

    /// Sleep time in seconds between batches.
    #[arg(long = "sleep_time", visible_alias = "sleep-time", default_value_t = DEFAULT_SLEEP_SECS)]
    pub sleep_time: u64,
}

impl PopulateExpiryDateArgs {
    pub fn into_params(self, days_good_for: i64) -> BackfillParams {
        BackfillParams {
            batch_size: self.batch_size,
            sleep_time: Duration::from_secs(self.sleep_time),
            days_good_for,
        }
    }
}

#[derive(Debug, Args)]
pub struct SendVerificationExpiryEmailArgs {
    /// Days after which the email is resent to learners still expired.
    #[arg(short = 'd', long = "resend-days", default_value_t = DEFAULT_RESEND_DAYS)]
    pub resend_days: u32,

    /// Maximum number of learners emailed by one queued task.
    #[arg(
        long = "batch-size",
        visible_alias = "batch_size",
        default_value_t = DEFAULT_BATCH_SIZE,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub batch_size: u64,

    /// Sleep time in seconds between batches.
    #[arg(long = "sleep-time", visible_alias = "sleep_time", default_value_t = DEFAULT_SLEEP_SECS)]
    pub sleep_time: u64,

    /// Number of days before now to look for expired verifications.
    #[arg(long = "days-range", default_value_t = DEFAULT_DAYS_RANGE)]
    pub days_range: u32,

    /// Log the user id ranges that would be emailed without sending anything.
    #[arg(long = "dry-run")]
    pub dry_run: bool,
}

impl From<SendVerificationExpiryEmailArgs> for ExpiryEmailParams {
    fn from(args: SendVerificationExpiryEmailArgs) -> Self {
        Self {
            resend_days: args.resend_days,
            batch_size: args.batch_size,
            sleep_time: Duration::from_secs(args.sleep_time),
            days_range: args.days_range,
            dry_run: args.dry_run,
        }
    }
}
