use std::collections::BTreeMap;

use anyhow::anyhow;
use prefill_protocol::{IntentPayload, IntentStatus};
use uuid::Uuid;

use crate::applications::lifecycle::{check_intent_creation, ApplicationStatus};
use crate::auth::{IntentDraft, IssuedIntent, TokenService};
use crate::errors::AppError;
use crate::models::intent::PrefillIntentRow;
use crate::models::packet::{PacketRow, ProfileRow};
use crate::store::Store;

/// Canonical field map for the profile. Blank values are left out so the agent
/// does not report them as missing.
pub fn build_user_fields(profile: &ProfileRow) -> BTreeMap<String, String> {
    let full_name = format!("{} {}", profile.name.trim(), profile.surname.trim());
    let candidates = [
        ("name", Some(full_name.trim().to_string())),
        ("email", Some(profile.email.clone())),
        ("phone", profile.phone.clone()),
        ("linkedin", profile.linkedin.clone()),
        ("github", profile.github.clone()),
        ("location_city", profile.location_city.clone()),
        ("location_country", profile.location_country.clone()),
    ];

    candidates
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value?.trim().to_string();
            (!value.is_empty()).then(|| (key.to_string(), value))
        })
        .collect()
}

pub fn build_attachments(packet: &PacketRow) -> BTreeMap<String, String> {
    let mut attachments = BTreeMap::new();
    if let Some(path) = packet.resume_path.as_deref().filter(|p| !p.trim().is_empty()) {
        attachments.insert("resume".to_string(), path.to_string());
    }
    attachments
}

pub fn parse_stored_status(raw: &str) -> Result<ApplicationStatus, AppError> {
    raw.parse::<ApplicationStatus>()
        .map_err(|e| AppError::Internal(anyhow!("corrupt application status: {e}")))
}

/// Freezes the application's packet and profile into a new intent and mints
/// its token.
pub async fn create_intent(
    store: &dyn Store,
    tokens: &TokenService,
    application_id: Uuid,
) -> Result<IssuedIntent, AppError> {
    let application = store
        .get_application(application_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {application_id} not found")))?;

    let current = parse_stored_status(&application.status)?;
    check_intent_creation(current).map_err(|e| AppError::Conflict(e.to_string()))?;

    let packet = store
        .get_packet(application.packet_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Packet {} not found", application.packet_id)))?;
    let profile = store
        .get_profile()
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    tokens
        .issue(IntentDraft {
            application_id: application.id,
            packet_id: packet.id,
            job_url: application.job_url.clone(),
            user_fields: build_user_fields(&profile),
            attachments: build_attachments(&packet),
        })
        .await
}

pub fn intent_payload(intent: &PrefillIntentRow) -> Result<IntentPayload, AppError> {
    let status = intent
        .status
        .parse::<IntentStatus>()
        .map_err(|e| AppError::Internal(anyhow!("corrupt intent status: {e}")))?;
    Ok(IntentPayload {
        intent_id: intent.id,
        job_url: intent.job_url.clone(),
        user_fields: intent.user_fields.0.clone(),
        attachments: intent.attachments.0.clone(),
        status,
        expires_at: intent.token_expires_at,
    })
}
