//! Persistence seam. `AppState` carries an `Arc<dyn Store>`; `PgStore` is the
//! production backend and `MemoryStore` backs the tests.

pub mod postgres;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prefill_protocol::IntentStatus;
use uuid::Uuid;

use crate::applications::lifecycle::{ApplicationStatus, Transition};
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, StatusHistoryRow};
use crate::models::intent::{PrefillIntentRow, PrefillLogRow};
use crate::models::packet::{PacketRow, ProfileRow};

pub use postgres::PgStore;

#[derive(Debug, Clone)]
pub struct ApplicationFilter {
    pub status: Option<ApplicationStatus>,
    pub limit: i64,
    pub skip: i64,
}

/// Everything the Result Reporter writes for one accepted log.
#[derive(Debug, Clone)]
pub struct ReportCommit {
    pub intent_id: Uuid,
    pub intent_status: IntentStatus,
    pub log: PrefillLogRow,
    /// False when a newer intent has replaced this one on the application.
    pub link_application: bool,
    pub transitions: Vec<Transition>,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_profile(&self) -> Result<Option<ProfileRow>, AppError>;

    async fn get_packet(&self, packet_id: Uuid) -> Result<Option<PacketRow>, AppError>;

    async fn find_application_for_packet(
        &self,
        packet_id: Uuid,
    ) -> Result<Option<ApplicationRow>, AppError>;

    /// Inserts the application together with its first history entry.
    async fn insert_application(
        &self,
        application: &ApplicationRow,
        initial: &StatusHistoryRow,
    ) -> Result<(), AppError>;

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, AppError>;

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationRow>, AppError>;

    /// History in insertion order.
    async fn status_history(&self, application_id: Uuid)
        -> Result<Vec<StatusHistoryRow>, AppError>;

    /// Updates the application's status columns and appends one history row.
    async fn apply_transition(&self, transition: &Transition) -> Result<(), AppError>;

    /// Inserts the intent and applies `transition` in the same transaction.
    async fn insert_intent(
        &self,
        intent: &PrefillIntentRow,
        transition: &Transition,
    ) -> Result<(), AppError>;

    async fn get_intent(&self, id: Uuid) -> Result<Option<PrefillIntentRow>, AppError>;

    /// Closes a pending intent, persists the log and applies the transitions
    /// atomically. Returns `false` without writing anything when the intent
    /// was no longer pending (first write wins).
    async fn commit_report(&self, commit: &ReportCommit) -> Result<bool, AppError>;

    /// Marks every pending intent whose expiry is at or before `now` as expired.
    async fn expire_intents(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    async fn get_log(&self, id: Uuid) -> Result<Option<PrefillLogRow>, AppError>;
}
