use clap::Parser;
use rustls::crypto;
use rustls::crypto::CryptoProvider;
use sea_orm::Database;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use verify_student::AppResources;
use verify_student::cli::Cli;
use verify_student::commands;
use verify_student::config::load_config;
use verify_student::mail::SmtpEmailSender;

fn initialize_standard_tracing() {
    let default_directives = "verify_student=info,sea_orm=warn,sqlx=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    initialize_standard_tracing();

    let config = Arc::new(load_config()?);

    let ring_provider = crypto::ring::default_provider();
    if CryptoProvider::install_default(ring_provider).is_err() {
        tracing::debug!("crypto provider already installed");
    }

    let db = Arc::new(Database::connect(&config.database_url).await?);
    let mailer = Arc::new(SmtpEmailSender::from_config(&config.smtp)?);

    let resources = Arc::new(AppResources { db, mailer, config });
    commands::run(cli.command, resources).await?;
    Ok(())
}
