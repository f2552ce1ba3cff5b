//! Result Reporter: the only writer of prefill logs.
//!
//! A log is accepted only with a token that still validates. Rejected logs are
//! not persisted anywhere; the agent's console output is the only trace of
//! such a run.

use prefill_protocol::{IntentStatus, PrefillLog, ReportResultRequest, ReportResultResponse};
use sqlx::types::Json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::applications::lifecycle::{reporter_transitions, ApplicationStatus, Transition};
use crate::auth::TokenService;
use crate::errors::AppError;
use crate::models::intent::PrefillLogRow;
use crate::prefill::intents::parse_stored_status;
use crate::store::{ReportCommit, Store};

fn transition_note(status: ApplicationStatus, log: &PrefillLog) -> String {
    match status {
        ApplicationStatus::Prefilling => "Prefill run executed by local agent".to_string(),
        ApplicationStatus::Prefilled => format!(
            "Prefill completed with {} fields filled, {} missing, {} errors",
            log.filled_count(),
            log.missing_fields.len(),
            log.error_count()
        ),
        _ => format!(
            "Prefill failed: {}",
            log.fatal_error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn check_log(intent_id: Uuid, log: &PrefillLog) -> Result<(), AppError> {
    if log.intent_id != intent_id {
        return Err(AppError::Validation(
            "log.intent_id does not match intent_id".to_string(),
        ));
    }
    if !(0.0..=1.0).contains(&log.detection_confidence) {
        return Err(AppError::Validation(
            "detection_confidence must be within [0, 1]".to_string(),
        ));
    }
    Ok(())
}

pub async fn report(
    store: &dyn Store,
    tokens: &TokenService,
    request: ReportResultRequest,
) -> Result<ReportResultResponse, AppError> {
    let ReportResultRequest {
        intent_id,
        token,
        log,
    } = request;

    let intent = tokens.validate(intent_id, &token).await?;
    drop(token);
    check_log(intent_id, &log)?;

    let application = store
        .get_application(intent.application_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("Application {} not found", intent.application_id))
        })?;
    let current = parse_stored_status(&application.status)?;

    if !log.stopped_before_submit {
        error!("Agent reported a run for intent {intent_id} that did not stop before submit");
    }

    let now = tokens.now();
    let run_failed = log.fatal_error.is_some();
    let intent_status = if run_failed {
        IntentStatus::Failed
    } else {
        IntentStatus::Completed
    };

    // A re-issued intent takes over the application; the older one may still
    // report, but only its log is kept.
    let superseded = application.prefill_intent_id != Some(intent_id);
    if superseded {
        warn!(
            "Intent {intent_id} was superseded on application {}; storing its log without a status change",
            application.id
        );
    }
    let transitions: Vec<Transition> = if superseded {
        vec![]
    } else {
        reporter_transitions(current, run_failed)
            .into_iter()
            .map(|status| Transition::new(application.id, status, transition_note(status, &log), now))
            .collect()
    };
    let final_status = transitions
        .last()
        .map(|t| t.status)
        .unwrap_or(current);

    let filled_fields_count = log.filled_count();
    let errors_count = log.error_count();
    let log_row = PrefillLogRow {
        id: Uuid::new_v4(),
        intent_id,
        application_id: application.id,
        detected_ats: log.detected_ats.clone(),
        detection_confidence: log.detection_confidence,
        stopped_before_submit: log.stopped_before_submit,
        log: Json(log),
        created_at: now,
    };
    let log_id = log_row.id;

    let committed = store
        .commit_report(&ReportCommit {
            intent_id,
            intent_status,
            log: log_row,
            link_application: !superseded,
            transitions,
        })
        .await?;

    if !committed {
        // Lost the race against another report for the same intent.
        warn!("Discarded duplicate report for intent {intent_id}");
        return Err(AppError::Unauthorized);
    }

    info!(
        "Recorded prefill log {log_id} for intent {intent_id}: {filled_fields_count} filled, {errors_count} errors, application now {}",
        final_status.as_str()
    );

    Ok(ReportResultResponse {
        log_id,
        filled_fields_count,
        errors_count,
        application_status: Some(final_status.as_str().to_string()),
        message: "Prefill result recorded".to_string(),
    })
}
