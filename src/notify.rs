//! Outcome notification.
//!
//! Formats the per-plan status email and delivers it through the notifier
//! collaborator. Delivery failure is logged by the orchestrator and
//! swallowed; it never influences control flow.

use aws_sdk_sesv2::Client;
use aws_sdk_sesv2::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_sesv2::error::DisplayErrorContext;
use aws_sdk_sesv2::types::{Body, Content, Destination, EmailContent, Message};
use log::info;
use thiserror::Error;
use tokio::runtime::Handle;

use crate::config::AwsSettings;
use crate::plan::{Outcome, Plan};

/// Tag prefixed to every status email subject.
pub const SUBJECT_TAG: &str = "[s3backup]";

/// Timestamp layout used in notification bodies.
const TIMESTAMP_FORMAT: &str = "%a, %d %b %Y %H:%M:%S +0000";

#[derive(Debug, Error)]
#[error("failed to send status email to `{to}`: {message}")]
pub struct NotifyError {
    to: String,
    message: String,
}

impl NotifyError {
    pub fn new(to: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            message: message.into(),
        }
    }
}

/// Delivers a status message for one plan outcome.
pub trait Notifier {
    fn send(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Renders the subject and body of the status email for one outcome.
pub fn status_email(plan: &Plan, outcome: &Outcome) -> (String, String) {
    let result = if outcome.succeeded() {
        "SUCCESS"
    } else {
        "FAILURE"
    };
    let subject = format!("{SUBJECT_TAG} [{result}] - Plan: {}", plan.name());
    let mut body = format!(
        "The backup plan, {}, run at {} was {result}",
        plan.name(),
        outcome.finished_at().format(TIMESTAMP_FORMAT)
    );
    if let Some(detail) = outcome.failure_detail() {
        body.push_str(&format!("\n\nDetailed failure information:\n\n{detail}"));
    }
    (subject, body)
}

/// SES-backed notifier.
pub struct SesNotifier {
    client: Client,
    handle: Handle,
}

impl SesNotifier {
    pub fn new(handle: Handle, aws: &AwsSettings) -> Self {
        let credentials = Credentials::new(
            aws.access_key.clone(),
            aws.secret_key.clone(),
            None,
            None,
            "s3backup-config",
        );
        let config = aws_sdk_sesv2::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(aws.region.clone()))
            .credentials_provider(credentials)
            .build();
        Self {
            client: Client::from_conf(config),
            handle,
        }
    }
}

impl Notifier for SesNotifier {
    fn send(&self, from: &str, to: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        info!("sending status email to {to}");
        let subject = Content::builder()
            .data(subject)
            .build()
            .map_err(|e| NotifyError::new(to, e.to_string()))?;
        let text = Content::builder()
            .data(body)
            .build()
            .map_err(|e| NotifyError::new(to, e.to_string()))?;
        let message = Message::builder()
            .subject(subject)
            .body(Body::builder().text(text).build())
            .build();
        let content = EmailContent::builder().simple(message).build();
        let destination = Destination::builder().to_addresses(to).build();

        self.handle.block_on(async {
            self.client
                .send_email()
                .from_email_address(from)
                .destination(destination)
                .content(content)
                .send()
                .await
                .map(|_| ())
                .map_err(|e| NotifyError::new(to, DisplayErrorContext(e).to_string()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawPlan;
    use crate::error::StageError;
    use crate::fileset::FilesetError;
    use chrono::{TimeZone, Utc};
    use std::path::PathBuf;

    fn plan() -> Plan {
        Plan::new(RawPlan {
            name: "db".to_string(),
            source: "/data/*.sql".to_string(),
            output: PathBuf::from("/tmp/db.zip"),
            command: None,
        })
        .unwrap()
    }

    #[test]
    fn success_subject_and_body() {
        let outcome = Outcome::Completed {
            finished_at: Utc.with_ymd_and_hms(2015, 6, 15, 10, 30, 0).unwrap(),
        };
        let (subject, body) = status_email(&plan(), &outcome);

        assert_eq!(subject, "[s3backup] [SUCCESS] - Plan: db");
        assert_eq!(
            body,
            "The backup plan, db, run at Mon, 15 Jun 2015 10:30:00 +0000 was SUCCESS"
        );
    }

    #[test]
    fn failure_body_appends_the_detail() {
        let outcome = Outcome::Failed {
            detail: StageError::Fileset(FilesetError::NoMatch {
                pattern: "/empty/*.sql".to_string(),
            }),
            finished_at: Utc.with_ymd_and_hms(2015, 6, 15, 10, 30, 0).unwrap(),
        };
        let (subject, body) = status_email(&plan(), &outcome);

        assert_eq!(subject, "[s3backup] [FAILURE] - Plan: db");
        assert!(body.starts_with("The backup plan, db, run at Mon, 15 Jun 2015 10:30:00 +0000 was FAILURE"));
        assert!(body.ends_with(
            "\n\nDetailed failure information:\n\nno input files matched pattern `/empty/*.sql`"
        ));
    }
}
