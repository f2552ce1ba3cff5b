use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use prefill_protocol::PrefillLog;
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrefillIntentRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub packet_id: Uuid,
    pub job_url: String,
    pub user_fields: Json<BTreeMap<String, String>>,
    pub attachments: Json<BTreeMap<String, String>>,
    /// Hex SHA-256 of the bearer token. The plaintext is never stored.
    #[serde(skip_serializing)]
    pub token_hash: String,
    pub token_expires_at: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct PrefillLogRow {
    pub id: Uuid,
    pub intent_id: Uuid,
    pub application_id: Uuid,
    pub detected_ats: Option<String>,
    pub detection_confidence: f64,
    pub stopped_before_submit: bool,
    pub log: Json<PrefillLog>,
    pub created_at: DateTime<Utc>,
}
