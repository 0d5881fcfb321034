use serde::Deserialize;
use thiserror::Error;

/// Number of days an approved verification stays valid when no override is configured.
pub const DEFAULT_DAYS_GOOD_FOR: i64 = 365;
/// Upper bound for `days_good_for`, a hundred years.
pub const MAX_DAYS_GOOD_FOR: i64 = 36_500;

/// Path appended to `lms_root_url` to build the reverification link.
pub const REVERIFY_PATH: &str = "/verify_student/reverify/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration build error: {0}")]
    Build(#[from] config::ConfigError),
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

#[derive(Clone, Debug, Deserialize)]
pub struct SmtpConfig {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub from: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VerifyStudentConfig {
    /// Days after the approval's `updated_at` at which a verification expires.
    #[serde(default = "default_days_good_for")]
    pub days_good_for: i64,
}

impl Default for VerifyStudentConfig {
    fn default() -> Self {
        Self {
            days_good_for: DEFAULT_DAYS_GOOD_FOR,
        }
    }
}

fn default_days_good_for() -> i64 {
    DEFAULT_DAYS_GOOD_FOR
}

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub smtp: SmtpConfig,
    pub platform_name: String,
    pub lms_root_url: String,
    pub id_verification_support_link: String,
    #[serde(default)]
    pub verify_student: VerifyStudentConfig,
}

impl AppConfig {
    /// Full reverification URL shown to learners.
    pub fn reverification_link(&self) -> String {
        format!("{}{}", self.lms_root_url.trim_end_matches('/'), REVERIFY_PATH)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smtp.port == 0 {
            return Err(ConfigError::Validation("smtp.port must be > 0".into()));
        }
        if self.verify_student.days_good_for <= 0 {
            return Err(ConfigError::Validation(
                "verify_student.days_good_for must be > 0".into(),
            ));
        }
        if self.verify_student.days_good_for > MAX_DAYS_GOOD_FOR {
            return Err(ConfigError::Validation(format!(
                "verify_student.days_good_for must be <= {MAX_DAYS_GOOD_FOR}"
            )));
        }
        if self.platform_name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "platform_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Load application configuration from `config.yaml` + environment overrides.
///
/// Any environment variable matching the key path separated by double
/// underscores (e.g. `SMTP__PORT`, `VERIFY_STUDENT__DAYS_GOOD_FOR`) overrides
/// the file value. A `.env` file, when present, is loaded into the process
/// environment first.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    use config::{Config, Environment, File};
    let _ = dotenvy::dotenv();

    let cfg = Config::builder()
        .add_source(File::with_name("config.yaml"))
        .add_source(Environment::default().separator("__"))
        .build()?;

    let app: AppConfig = cfg.try_deserialize()?;
    app.validate()?;
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AppConfig {
        AppConfig {
            database_url: "sqlite::memory:".into(),
            smtp: SmtpConfig {
                server: "localhost".into(),
                port: 25,
                username: "u".into(),
                password: "p".into(),
                from: "registration@example.com".into(),
            },
            platform_name: "Example University".into(),
            lms_root_url: "https://lms.example.com/".into(),
            id_verification_support_link: "https://support.example.com/id".into(),
            verify_student: VerifyStudentConfig::default(),
        }
    }

    #[test]
    fn reverification_link_strips_trailing_slash() {
        assert_eq!(
            sample().reverification_link(),
            "https://lms.example.com/verify_student/reverify/"
        );
    }

    #[test]
    fn validate_accepts_defaults() {
        assert!(sample().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_port() {
        let mut cfg = sample();
        cfg.smtp.port = 0;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_non_positive_days_good_for() {
        let mut cfg = sample();
        cfg.verify_student.days_good_for = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validate_rejects_days_good_for_above_limit() {
        let mut cfg = sample();
        cfg.verify_student.days_good_for = MAX_DAYS_GOOD_FOR + 1;
        assert!(matches!(cfg.validate(), Err(ConfigError::Validation(_))));
        cfg.verify_student.days_good_for = MAX_DAYS_GOOD_FOR;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_platform_name() {
        let mut cfg = sample();
        cfg.platform_name = "  ".into();
        assert!(cfg.validate().is_err());
    }
}
