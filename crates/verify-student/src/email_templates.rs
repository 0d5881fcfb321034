//! Plain-text rendering of the verification expiry email.
use crate::config::AppConfig;

/// Template variables shared by every email of one run.
///
/// Built once per invocation from configuration; the learner's name is added
/// per recipient through [`ExpiryEmailContext::for_learner`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpiryEmailContext {
    pub platform_name: String,
    pub lms_verification_link: String,
    pub help_center_link: String,
    pub from_address: String,
}

impl ExpiryEmailContext {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            platform_name: config.platform_name.clone(),
            lms_verification_link: config.reverification_link(),
            help_center_link: config.id_verification_support_link.clone(),
            from_address: config.smtp.from.clone(),
        }
    }

    pub fn subject(&self) -> String {
        format!("Your {} Verification has Expired", self.platform_name)
    }

    pub fn for_learner(&self, full_name: &str) -> VerificationExpiryEmail {
        VerificationExpiryEmail {
            platform_name: self.platform_name.clone(),
            lms_verification_link: self.lms_verification_link.clone(),
            help_center_link: self.help_center_link.clone(),
            full_name: full_name.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerificationExpiryEmail {
    pub platform_name: String,
    pub lms_verification_link: String,
    pub help_center_link: String,
    pub full_name: String,
}

impl VerificationExpiryEmail {
    #[tracing::instrument(skip(self))]
    pub fn render_text(&self) -> String {
        let greeting = if self.full_name.trim().is_empty() {
            "Hello,".to_string()
        } else {
            format!("Hello {},", self.full_name.trim())
        };

        format!(
            r#"{}

Your {} ID verification has expired.

You must have a valid ID verification to take proctored exams and qualify for certificates.
Follow the link below to submit your photos and renew your ID verification:

{}

If you have any questions, visit {}

Thanks,
The {} Team"#,
            greeting,
            self.platform_name,
            self.lms_verification_link,
            self.help_center_link,
            self.platform_name
        )
    }
}
