use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use prefill_protocol::IntentStatus;
use sqlx::types::Json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::applications::lifecycle::{ApplicationStatus, Transition};
use crate::auth::token::{token_matches, PlaintextToken};
use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::intent::PrefillIntentRow;
use crate::store::Store;

/// Everything an intent freezes at issuance, except the token.
#[derive(Debug, Clone)]
pub struct IntentDraft {
    pub application_id: Uuid,
    pub packet_id: Uuid,
    pub job_url: String,
    pub user_fields: BTreeMap<String, String>,
    pub attachments: BTreeMap<String, String>,
}

#[derive(Debug)]
pub struct IssuedIntent {
    pub intent_id: Uuid,
    pub token: PlaintextToken,
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates prefill tokens.
///
/// A token authorizes any number of reads of its intent until it expires, but
/// once the intent leaves `pending` (reported, failed, or swept as expired)
/// the token is dead regardless of its remaining lifetime.
#[derive(Clone)]
pub struct TokenService {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl TokenService {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self { store, clock, ttl }
    }

    /// Persists a new pending intent holding only the token hash, moves the
    /// application to `intent_created`, and returns the plaintext once.
    pub async fn issue(&self, draft: IntentDraft) -> Result<IssuedIntent, AppError> {
        let token = PlaintextToken::generate();
        let now = self.clock.now();
        let expires_at = now + self.ttl;

        let intent = PrefillIntentRow {
            id: Uuid::new_v4(),
            application_id: draft.application_id,
            packet_id: draft.packet_id,
            job_url: draft.job_url,
            user_fields: Json(draft.user_fields),
            attachments: Json(draft.attachments),
            token_hash: token.hash(),
            token_expires_at: expires_at,
            status: IntentStatus::Pending.as_str().to_string(),
            created_at: now,
        };
        let transition = Transition::new(
            draft.application_id,
            ApplicationStatus::IntentCreated,
            "Prefill intent created",
            now,
        )
        .with_intent(intent.id);

        self.store.insert_intent(&intent, &transition).await?;

        info!(
            "Issued prefill intent {} for application {} (expires {})",
            intent.id, draft.application_id, expires_at
        );

        Ok(IssuedIntent {
            intent_id: intent.id,
            token,
            expires_at,
        })
    }

    /// Returns the intent when the token matches, `now < expires_at`, and the
    /// intent is still pending. Every other case is the same `Unauthorized`.
    /// Reading never changes the intent.
    pub async fn validate(
        &self,
        intent_id: Uuid,
        presented: &str,
    ) -> Result<PrefillIntentRow, AppError> {
        let intent = self
            .store
            .get_intent(intent_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Intent {intent_id} not found")))?;

        let now = self.clock.now();
        let token_ok = token_matches(presented, &intent.token_hash);
        let fresh = now < intent.token_expires_at;
        let open = intent.status == IntentStatus::Pending.as_str();

        // Non-short-circuit on purpose: every check runs for every request.
        if token_ok & fresh & open {
            Ok(intent)
        } else {
            warn!("Rejected prefill token for intent {intent_id}");
            Err(AppError::Unauthorized)
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
