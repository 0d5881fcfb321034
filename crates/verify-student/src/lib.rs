//! Batch jobs for identity-verification expiry.
//!
//! `populate-expiry-date` backfills the expiry date of every learner's most
//! recent approved verification; `send-verification-expiry-email` notifies
//! learners whose verification expired, at most once per resend window.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::mail::EmailSender;

pub mod cli;
pub mod commands;
pub mod config;
pub mod email_templates;
pub mod entity;
pub mod error;
pub mod expiry;
pub mod mail;

#[derive(Clone)]
pub struct AppResources {
    pub db: Arc<DatabaseConnection>,
    pub mailer: Arc<dyn EmailSender>,
    pub config: Arc<AppConfig>,
}
