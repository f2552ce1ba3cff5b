//! Application lifecycle rules.
//!
//! ```text
//! prepared → intent_created → prefilling → prefilled → applied
//!                                                        ↓
//!                                interviewing → offered → {accepted, declined}
//! rejected / withdrawn reachable from anywhere
//! ```
//!
//! `intent_created`, `prefilling` and `prefilled` are owned by the prefill
//! pipeline. Every other status is chosen by the user, and the pipeline never
//! produces `applied`: only the user knows whether the form was submitted.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[cfg(test)]
use crate::models::application::ApplicationRow;
use crate::models::application::StatusHistoryRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Prepared,
    IntentCreated,
    Prefilling,
    Prefilled,
    Applied,
    Interviewing,
    Offered,
    Accepted,
    Declined,
    Rejected,
    Withdrawn,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 11] = [
        ApplicationStatus::Prepared,
        ApplicationStatus::IntentCreated,
        ApplicationStatus::Prefilling,
        ApplicationStatus::Prefilled,
        ApplicationStatus::Applied,
        ApplicationStatus::Interviewing,
        ApplicationStatus::Offered,
        ApplicationStatus::Accepted,
        ApplicationStatus::Declined,
        ApplicationStatus::Rejected,
        ApplicationStatus::Withdrawn,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Prepared => "prepared",
            ApplicationStatus::IntentCreated => "intent_created",
            ApplicationStatus::Prefilling => "prefilling",
            ApplicationStatus::Prefilled => "prefilled",
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Interviewing => "interviewing",
            ApplicationStatus::Offered => "offered",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Declined => "declined",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Withdrawn => "withdrawn",
        }
    }

    /// Statuses only the prefill pipeline may set.
    pub fn is_system_managed(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::IntentCreated
                | ApplicationStatus::Prefilling
                | ApplicationStatus::Prefilled
        )
    }

    /// Statuses from which a (re)prefill may start or be reported.
    pub fn is_prefill_phase(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Prepared
                | ApplicationStatus::IntentCreated
                | ApplicationStatus::Prefilling
                | ApplicationStatus::Prefilled
        )
    }
}

impl FromStr for ApplicationStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| TransitionError::UnknownStatus(s.to_string()))
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum TransitionError {
    #[error("unknown application status '{0}'")]
    UnknownStatus(String),

    #[error("status '{0}' is managed by the prefill pipeline and cannot be set manually")]
    SystemManaged(&'static str),

    #[error("cannot start a prefill while the application is '{0}'")]
    NotInPrefillPhase(&'static str),
}

/// Any user-chosen status is reachable from any state, including reversals
/// such as `declined` after `accepted`.
pub fn check_user_transition(target: ApplicationStatus) -> Result<(), TransitionError> {
    if target.is_system_managed() {
        return Err(TransitionError::SystemManaged(target.as_str()));
    }
    Ok(())
}

pub fn check_intent_creation(current: ApplicationStatus) -> Result<(), TransitionError> {
    if !current.is_prefill_phase() {
        return Err(TransitionError::NotInPrefillPhase(current.as_str()));
    }
    Ok(())
}

/// Statuses the Result Reporter appends for one received log.
///
/// Empty when the user has already moved the application out of the prefill
/// phase; the log is still stored, but the user's choice is not overwritten.
pub fn reporter_transitions(current: ApplicationStatus, run_failed: bool) -> Vec<ApplicationStatus> {
    if !current.is_prefill_phase() {
        return vec![];
    }
    if run_failed {
        vec![ApplicationStatus::Prefilling, ApplicationStatus::IntentCreated]
    } else {
        vec![ApplicationStatus::Prefilling, ApplicationStatus::Prefilled]
    }
}

/// A single status change plus the history entry it appends.
#[derive(Debug, Clone)]
pub struct Transition {
    pub application_id: Uuid,
    pub status: ApplicationStatus,
    pub note: String,
    pub at: DateTime<Utc>,
    pub intent_id: Option<Uuid>,
}

impl Transition {
    pub fn new(
        application_id: Uuid,
        status: ApplicationStatus,
        note: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            application_id,
            status,
            note: note.into(),
            at,
            intent_id: None,
        }
    }

    pub fn with_intent(mut self, intent_id: Uuid) -> Self {
        self.intent_id = Some(intent_id);
        self
    }

    pub fn history_row(&self) -> StatusHistoryRow {
        StatusHistoryRow {
            id: Uuid::new_v4(),
            application_id: self.application_id,
            status: self.status.as_str().to_string(),
            note: self.note.clone(),
            created_at: self.at,
        }
    }

    /// Applies the column updates of this transition to an in-memory row.
    /// `PgStore::apply_transition` issues the equivalent UPDATE.
    #[cfg(test)]
    pub fn apply_to(&self, app: &mut ApplicationRow) {
        app.status = self.status.as_str().to_string();
        app.updated_at = self.at;
        if self.status == ApplicationStatus::Applied && app.applied_at.is_none() {
            app.applied_at = Some(self.at);
        }
        if let Some(intent_id) = self.intent_id {
            app.prefill_intent_id = Some(intent_id);
        }
    }
}
