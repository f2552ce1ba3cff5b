//! In-memory `Store` used by the unit and route tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use prefill_protocol::{IntentStatus, PrefillLog};
use sqlx::types::Json;
use uuid::Uuid;

use crate::applications::lifecycle::Transition;
use crate::errors::AppError;
use crate::models::application::{ApplicationRow, StatusHistoryRow};
use crate::models::intent::{PrefillIntentRow, PrefillLogRow};
use crate::models::packet::{PacketRow, ProfileRow};
use crate::store::{ApplicationFilter, ReportCommit, Store};

#[derive(Default)]
struct Inner {
    profile: Option<ProfileRow>,
    packets: HashMap<Uuid, PacketRow>,
    applications: HashMap<Uuid, ApplicationRow>,
    history: Vec<StatusHistoryRow>,
    intents: HashMap<Uuid, PrefillIntentRow>,
    logs: HashMap<Uuid, PrefillLogRow>,
}

impl Inner {
    fn write_transition(&mut self, t: &Transition) {
        if let Some(app) = self.applications.get_mut(&t.application_id) {
            t.apply_to(app);
        }
        self.history.push(t.history_row());
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap()
    }

    pub fn seed_profile(&self, profile: ProfileRow) {
        self.lock().profile = Some(profile);
    }

    pub fn seed_packet(&self, packet: PacketRow) {
        self.lock().packets.insert(packet.id, packet);
    }

    pub fn log_count(&self) -> usize {
        self.lock().logs.len()
    }
}

pub fn sample_profile() -> ProfileRow {
    ProfileRow {
        id: Uuid::new_v4(),
        name: "Ada".to_string(),
        surname: "Lovelace".to_string(),
        email: "ada@example.com".to_string(),
        phone: Some("+44 20 7946 0000".to_string()),
        linkedin: None,
        github: Some("https://github.com/ada".to_string()),
        location_city: Some("London".to_string()),
        location_country: None,
    }
}

pub fn sample_packet() -> PacketRow {
    PacketRow {
        id: Uuid::new_v4(),
        job_id: Uuid::new_v4(),
        job_title: "Analytical Engine Programmer".to_string(),
        company_name: "Babbage & Co".to_string(),
        job_url: "https://boards.greenhouse.io/babbage/jobs/1".to_string(),
        resume_path: Some("/tmp/packets/ada/resume.pdf".to_string()),
        created_at: Utc::now(),
    }
}

pub fn sample_log_row(intent: &PrefillIntentRow, at: DateTime<Utc>) -> PrefillLogRow {
    let mut log = PrefillLog::failure(intent.id, "", at);
    log.fatal_error = None;
    PrefillLogRow {
        id: Uuid::new_v4(),
        intent_id: intent.id,
        application_id: intent.application_id,
        detected_ats: None,
        detection_confidence: 0.0,
        stopped_before_submit: true,
        log: Json(log),
        created_at: at,
    }
}

/// A store holding one profile and one packet.
pub fn seeded() -> (MemoryStore, PacketRow) {
    let store = MemoryStore::new();
    store.seed_profile(sample_profile());
    let packet = sample_packet();
    store.seed_packet(packet.clone());
    (store, packet)
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_profile(&self) -> Result<Option<ProfileRow>, AppError> {
        Ok(self.lock().profile.clone())
    }

    async fn get_packet(&self, packet_id: Uuid) -> Result<Option<PacketRow>, AppError> {
        Ok(self.lock().packets.get(&packet_id).cloned())
    }

    async fn find_application_for_packet(
        &self,
        packet_id: Uuid,
    ) -> Result<Option<ApplicationRow>, AppError> {
        Ok(self
            .lock()
            .applications
            .values()
            .find(|a| a.packet_id == packet_id)
            .cloned())
    }

    async fn insert_application(
        &self,
        application: &ApplicationRow,
        initial: &StatusHistoryRow,
    ) -> Result<(), AppError> {
        let mut inner = self.lock();
        inner.applications.insert(application.id, application.clone());
        inner.history.push(initial.clone());
        Ok(())
    }

    async fn get_application(&self, id: Uuid) -> Result<Option<ApplicationRow>, AppError> {
        Ok(self.lock().applications.get(&id).cloned())
    }

    async fn list_applications(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<Vec<ApplicationRow>, AppError> {
        let mut rows: Vec<ApplicationRow> = self
            .lock()
            .applications
            .values()
            .filter(|a| filter.status.map_or(true, |s| a.status == s.as_str()))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(rows
            .into_iter()
            .skip(filter.skip as usize)
            .take(filter.limit as usize)
            .collect())
    }

    async fn status_history(
        &self,
        application_id: Uuid,
    ) -> Result<Vec<StatusHistoryRow>, AppError> {
        Ok(self
            .lock()
            .history
            .iter()
            .filter(|h| h.application_id == application_id)
            .cloned()
            .collect())
    }

    async fn apply_transition(&self, transition: &Transition) -> Result<(), AppError> {
        self.lock().write_transition(transition);
        Ok(())
    }

    async fn insert_intent(
        &self,
        intent: &PrefillIntentRow,
        transition: &Transition,
    ) -> Result<(), AppError> {
        let mut inner = self.lock();
        inner.intents.insert(intent.id, intent.clone());
        inner.write_transition(transition);
        Ok(())
    }

    async fn get_intent(&self, id: Uuid) -> Result<Option<PrefillIntentRow>, AppError> {
        Ok(self.lock().intents.get(&id).cloned())
    }

    async fn commit_report(&self, commit: &ReportCommit) -> Result<bool, AppError> {
        let mut inner = self.lock();
        match inner.intents.get_mut(&commit.intent_id) {
            Some(intent) if intent.status == IntentStatus::Pending.as_str() => {
                intent.status = commit.intent_status.as_str().to_string();
            }
            _ => return Ok(false),
        }

        let log = commit.log.clone();
        if let Some(app) = inner
            .applications
            .get_mut(&log.application_id)
            .filter(|_| commit.link_application)
        {
            app.prefill_log_id = Some(log.id);
            app.last_prefill_at = Some(log.created_at);
            app.updated_at = log.created_at;
        }
        inner.logs.insert(log.id, log);
        for transition in &commit.transitions {
            inner.write_transition(transition);
        }
        Ok(true)
    }

    async fn expire_intents(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut expired = 0;
        for intent in self.lock().intents.values_mut() {
            if intent.status == IntentStatus::Pending.as_str() && intent.token_expires_at <= now {
                intent.status = IntentStatus::Expired.as_str().to_string();
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn get_log(&self, id: Uuid) -> Result<Option<PrefillLogRow>, AppError> {
        Ok(self.lock().logs.get(&id).cloned())
    }
}
