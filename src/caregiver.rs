//! Caregiver Notifier: reports a still-missed dose to the caregiver-alert
//! service, which fans the alert out to every linked caregiver's inbox.
//!
//! Fire-and-forget from the state machine's perspective: the follow-up alarm
//! has already fired and cannot be unfired, so a failed report is logged and
//! swallowed, never retried or rolled back.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::CAREGIVER_REQUEST_TIMEOUT_SECS;

/// Payload of one missed-dose report, field names matching the alert
/// service's wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissedDoseReport {
    pub med_id: Uuid,
    pub med_name: String,
    /// ISO calendar date of the missed dose ("YYYY-MM-DD").
    pub dose_date: NaiveDate,
    pub dose_index: usize,
}

/// What came of a report attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The alert service accepted the report; `notified` caregivers were
    /// fanned out to (zero linked caregivers is still a success).
    Reported { notified: u32 },
    /// No signed-in user at notify time; nothing was sent.
    SkippedUnauthenticated,
}

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Caregiver alert request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Caregiver alert service returned status {code}")]
    Status { code: u16 },

    #[error("Auth token lookup failed: {0}")]
    Auth(String),
}

/// Supplies the signed-in user's bearer token, `None` when nobody is
/// signed in.
#[async_trait]
pub trait AuthTokenSource: Send + Sync {
    async fn id_token(&self) -> Result<Option<String>, NotifyError>;
}

/// Reports unacknowledged doses to the external caregiver-alert service.
#[async_trait]
pub trait CaregiverNotifier: Send + Sync {
    async fn report_missed_dose(
        &self,
        report: &MissedDoseReport,
    ) -> Result<NotifyOutcome, NotifyError>;
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    notified: u32,
}

/// HTTP implementation against the deployed alert endpoint.
pub struct HttpCaregiverNotifier {
    client: reqwest::Client,
    base_url: String,
    auth: Arc<dyn AuthTokenSource>,
}

impl HttpCaregiverNotifier {
    /// `base_url` is the functions host, e.g.
    /// "https://us-central1-example.cloudfunctions.net".
    pub fn new(base_url: impl Into<String>, auth: Arc<dyn AuthTokenSource>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(CAREGIVER_REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            auth,
        })
    }
}

#[async_trait]
impl CaregiverNotifier for HttpCaregiverNotifier {
    async fn report_missed_dose(
        &self,
        report: &MissedDoseReport,
    ) -> Result<NotifyOutcome, NotifyError> {
        let Some(token) = self.auth.id_token().await? else {
            tracing::debug!(med_id = %report.med_id, "No signed-in user, skipping caregiver alert");
            return Ok(NotifyOutcome::SkippedUnauthenticated);
        };

        let url = format!("{}/reportMissedDose", self.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(report)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(NotifyError::Status {
                code: status.as_u16(),
            });
        }

        // Tolerate a missing or malformed body the way the service's other
        // clients do: a 2xx without a parseable count is still a success.
        let notified = match resp.json::<ReportResponse>().await {
            Ok(body) => {
                if !body.ok {
                    tracing::warn!(med_id = %report.med_id, "Caregiver alert service replied ok=false");
                }
                body.notified
            }
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable caregiver alert response body");
                0
            }
        };

        tracing::info!(med_id = %report.med_id, dose_index = report.dose_index, notified, "Caregiver alert reported");
        Ok(NotifyOutcome::Reported { notified })
    }
}
