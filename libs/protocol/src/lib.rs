//! Wire types shared by the prefill API and the local prefill agent.
//!
//! Both binaries serialize through these types only, so a field added here is
//! visible on both sides of the trust boundary at once.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Intent
// ────────────────────────────────────────────────────────────────────────────

/// Lifecycle of a prefill intent. Only `Pending` intents accept a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    Pending,
    Completed,
    Failed,
    Expired,
}

impl IntentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentStatus::Pending => "pending",
            IntentStatus::Completed => "completed",
            IntentStatus::Failed => "failed",
            IntentStatus::Expired => "expired",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for IntentStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(IntentStatus::Pending),
            "completed" => Ok(IntentStatus::Completed),
            "failed" => Ok(IntentStatus::Failed),
            "expired" => Ok(IntentStatus::Expired),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateIntentRequest {
    pub application_id: Uuid,
}

/// Returned exactly once by `create-intent`. The token is never retrievable again.
#[derive(Clone, Serialize, Deserialize)]
pub struct CreateIntentResponse {
    pub intent_id: Uuid,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub message: String,
}

impl fmt::Debug for CreateIntentResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateIntentResponse")
            .field("intent_id", &self.intent_id)
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// What the agent receives from `GET intent/{id}`. The token hash is never part of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentPayload {
    pub intent_id: Uuid,
    pub job_url: String,
    /// Canonical field name → value.
    pub user_fields: BTreeMap<String, String>,
    /// Attachment name (e.g. `resume`) → local file path.
    pub attachments: BTreeMap<String, String>,
    pub status: IntentStatus,
    pub expires_at: DateTime<Utc>,
}

// ────────────────────────────────────────────────────────────────────────────
// Outcome record
// ────────────────────────────────────────────────────────────────────────────

/// One attempted field. Fields that could not be located are not `FillResult`s;
/// they are listed in `PrefillLog::missing_fields`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillResult {
    pub field_name: String,
    pub value: String,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// How a canonical field was bound to a control on the live page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldMappingRecord {
    pub locator: String,
    pub strategy: String,
    pub kind: String,
}

fn default_true() -> bool {
    true
}

/// Immutable record of one executed intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefillLog {
    pub intent_id: Uuid,
    #[serde(default)]
    pub detected_ats: Option<String>,
    #[serde(default)]
    pub detection_confidence: f64,
    #[serde(default)]
    pub matched_signals: Vec<String>,
    #[serde(default)]
    pub filled_fields: Vec<FillResult>,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub resume_attached: bool,
    #[serde(default)]
    pub attachment_errors: Vec<String>,
    #[serde(default)]
    pub screenshot_paths: Vec<String>,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default = "default_true")]
    pub stopped_before_submit: bool,
    #[serde(default)]
    pub submit_override_requested: bool,
    #[serde(default)]
    pub fatal_error: Option<String>,
    #[serde(default)]
    pub field_mappings: BTreeMap<String, FieldMappingRecord>,
    pub timestamp: DateTime<Utc>,
}

impl PrefillLog {
    /// An empty log for a run that ended before any field could be attempted.
    pub fn failure(intent_id: Uuid, error: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            intent_id,
            detected_ats: None,
            detection_confidence: 0.0,
            matched_signals: vec![],
            filled_fields: vec![],
            missing_fields: vec![],
            resume_attached: false,
            attachment_errors: vec![],
            screenshot_paths: vec![],
            duration_seconds: 0.0,
            stopped_before_submit: true,
            submit_override_requested: false,
            fatal_error: Some(error.into()),
            field_mappings: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn filled_count(&self) -> usize {
        self.filled_fields.iter().filter(|f| f.success).count()
    }

    pub fn error_count(&self) -> usize {
        self.filled_fields.iter().filter(|f| !f.success).count()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ReportResultRequest {
    pub intent_id: Uuid,
    pub token: String,
    pub log: PrefillLog,
}

impl fmt::Debug for ReportResultRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReportResultRequest")
            .field("intent_id", &self.intent_id)
            .field("token", &"<redacted>")
            .field("log", &self.log)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResultResponse {
    pub log_id: Uuid,
    pub filled_fields_count: usize,
    pub errors_count: usize,
    pub application_status: Option<String>,
    pub message: String,
}
