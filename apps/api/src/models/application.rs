use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub packet_id: Uuid,
    pub profile_id: Uuid,
    pub job_title: String,
    pub company_name: String,
    pub job_url: String,
    pub status: String,
    pub prefill_intent_id: Option<Uuid>,
    pub prefill_log_id: Option<Uuid>,
    pub last_prefill_at: Option<DateTime<Utc>>,
    pub notes: String,
    pub applied_at: Option<DateTime<Utc>>,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One row of `application_status_history`. Rows are only ever inserted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct StatusHistoryRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub status: String,
    pub note: String,
    pub created_at: DateTime<Utc>,
}
