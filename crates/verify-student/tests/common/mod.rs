//! Shared fixtures: in-memory SQLite store and a recording mail sender.
#![allow(dead_code)]

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ConnectionTrait, Database,
    DatabaseConnection, DbBackend, EntityTrait, Statement,
};
use std::io;
use std::sync::{Arc, Mutex};
use time::OffsetDateTime;
use tracing_subscriber::fmt::MakeWriter;
use verify_student::AppResources;
use verify_student::config::{AppConfig, SmtpConfig, VerifyStudentConfig};
use verify_student::entity::verification::VerificationStatus;
use verify_student::entity::{user, verification};
use verify_student::error::MailError;
use verify_student::mail::{EmailSender, build_message};

pub async fn setup_test_db() -> Arc<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to in-memory database");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            full_name TEXT NOT NULL DEFAULT ''
        );"#,
    ))
    .await
    .expect("Failed to create user table");

    db.execute(Statement::from_string(
        DbBackend::Sqlite,
        r#"CREATE TABLE verification (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            status TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            expiry_date TEXT NULL,
            expiry_email_date TEXT NULL
        );"#,
    ))
    .await
    .expect("Failed to create verification table");

    Arc::new(db)
}

pub fn test_config() -> AppConfig {
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
        lms_root_url: "https://lms.example.com".into(),
        id_verification_support_link: "https://support.example.com/id".into(),
        verify_student: VerifyStudentConfig::default(),
    }
}

pub async fn create_user(db: &DatabaseConnection, email: &str, full_name: &str) -> user::Model {
    user::ActiveModel {
        id: NotSet,
        email: Set(email.to_string()),
        full_name: Set(full_name.to_string()),
    }
    .insert(db)
    .await
    .expect("Failed to insert user")
}

pub struct NewVerification {
    pub status: VerificationStatus,
    pub updated_at: OffsetDateTime,
    pub expiry_date: Option<OffsetDateTime>,
    pub expiry_email_date: Option<OffsetDateTime>,
}

impl NewVerification {
    pub fn approved(updated_at: OffsetDateTime) -> Self {
        Self {
            status: VerificationStatus::Approved,
            updated_at,
            expiry_date: None,
            expiry_email_date: None,
        }
    }

    pub fn expired(updated_at: OffsetDateTime, expiry_date: OffsetDateTime) -> Self {
        Self {
            expiry_date: Some(expiry_date),
            ..Self::approved(updated_at)
        }
    }
}

pub async fn create_verification(
    db: &DatabaseConnection,
    user_id: i32,
    new: NewVerification,
) -> verification::Model {
    verification::ActiveModel {
        id: NotSet,
        user_id: Set(user_id),
        status: Set(new.status),
        created_at: Set(new.updated_at),
        updated_at: Set(new.updated_at),
        expiry_date: Set(new.expiry_date),
        expiry_email_date: Set(new.expiry_email_date),
    }
    .insert(db)
    .await
    .expect("Failed to insert verification")
}

pub async fn reload(db: &DatabaseConnection, id: i32) -> verification::Model {
    verification::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query")
        .expect("verification exists")
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentEmail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Builds the real message (so bad addresses fail like SMTP would) and keeps
/// it instead of delivering.
#[derive(Default)]
pub struct RecordingSender {
    pub outbox: Mutex<Vec<SentEmail>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<SentEmail> {
        self.outbox.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmailSender for RecordingSender {
    async fn send(
        &self,
        from: &str,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), MailError> {
        build_message(from, to, subject, body)?;
        self.outbox.lock().unwrap().push(SentEmail {
            from: from.to_string(),
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub fn resources(
    db: Arc<DatabaseConnection>,
    mailer: Arc<RecordingSender>,
) -> Arc<AppResources> {
    Arc::new(AppResources {
        db,
        mailer,
        config: Arc::new(test_config()),
    })
}

/// Plain-text copy of every event emitted on the current thread while the
/// guard from [`CapturedLogs::install`] is alive.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
