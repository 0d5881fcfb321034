use config::Config;
use verify_student::config::{AppConfig, DEFAULT_DAYS_GOOD_FOR, SmtpConfig};
use verify_student::email_templates::ExpiryEmailContext;

const APP_YAML: &str = r#"
database_url: "postgres://localhost/lms"
platform_name: "Example University"
lms_root_url: "https://lms.example.com"
id_verification_support_link: "https://support.example.com/id"
smtp:
  server: "smtp.example.com"
  port: 587
  username: "user@example.com"
  password: "secret123"
  from: "registration@example.com"
"#;

fn from_yaml(yaml: &str) -> Result<AppConfig, config::ConfigError> {
    Config::builder()
        .add_source(config::File::from_str(yaml, config::FileFormat::Yaml))
        .build()
        .expect("Failed to build config")
        .try_deserialize()
}

#[test]
fn test_smtp_config_deserialization() {
    let yaml_content = r#"
server: "smtp.example.com"
port: 587
username: "user@example.com"
password: "secret123"
from: "noreply@example.com"
"#;

    let config = Config::builder()
        .add_source(config::File::from_str(
            yaml_content,
            config::FileFormat::Yaml,
        ))
        .build()
        .expect("Failed to build config");

    let smtp_config: SmtpConfig = config
        .try_deserialize()
        .expect("Failed to deserialize SMTP config");
    assert_eq!(smtp_config.server, "smtp.example.com");
    assert_eq!(smtp_config.port, 587);
    assert_eq!(smtp_config.from, "noreply@example.com");
}

#[test]
fn test_app_config_deserialization() {
    let app_config = from_yaml(APP_YAML).expect("Failed to deserialize app config");
    assert_eq!(app_config.database_url, "postgres://localhost/lms");
    assert_eq!(app_config.platform_name, "Example University");
    assert_eq!(app_config.smtp.port, 587);
    assert_eq!(
        app_config.verify_student.days_good_for,
        DEFAULT_DAYS_GOOD_FOR
    );
    assert!(app_config.validate().is_ok());
}

#[test]
fn test_days_good_for_override() {
    let yaml = format!("{APP_YAML}verify_student:\n  days_good_for: 730\n");
    let app_config = from_yaml(&yaml).expect("Failed to deserialize app config");
    assert_eq!(app_config.verify_student.days_good_for, 730);
}

#[test]
fn test_environment_overrides_file() {
    unsafe {
        std::env::set_var("VSTEST__PLATFORM_NAME", "Env Academy");

        let app_config: AppConfig = Config::builder()
            .add_source(config::File::from_str(APP_YAML, config::FileFormat::Yaml))
            .add_source(
                config::Environment::default()
                    .prefix("VSTEST")
                    .separator("__"),
            )
            .build()
            .expect("Failed to build config")
            .try_deserialize()
            .expect("Failed to deserialize");

        assert_eq!(app_config.platform_name, "Env Academy");
        assert_eq!(app_config.lms_root_url, "https://lms.example.com");

        std::env::remove_var("VSTEST__PLATFORM_NAME");
    }
}

#[test]
fn test_config_partial_structure() {
    let invalid_yaml = r#"
database_url: "postgres://localhost/lms"
# Missing smtp section and platform settings
"#;
    assert!(
        from_yaml(invalid_yaml).is_err(),
        "Should fail when required fields are missing"
    );
}

#[test]
fn test_email_context_from_config() {
    let app_config = from_yaml(APP_YAML).expect("Failed to deserialize app config");
    let context = ExpiryEmailContext::from_config(&app_config);
    assert_eq!(context.platform_name, "Example University");
    assert_eq!(
        context.lms_verification_link,
        "https://lms.example.com/verify_student/reverify/"
    );
    assert_eq!(context.help_center_link, "https://support.example.com/id");
    assert_eq!(context.from_address, "registration@example.com");
}
