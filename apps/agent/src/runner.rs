//! One prefill run: fetch → launch → navigate → detect → fill → attach → report.
//!
//! The pipeline is strictly sequential on a single page. Only failing to reach
//! the API, launch the browser or load the job page ends a run early, and the
//! last two still send a best-effort failure log.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use prefill_protocol::{IntentPayload, PrefillLog, ReportResultResponse};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapters::AdapterRegistry;
use crate::api_client::{ApiClient, AuthToken};
use crate::browser::{Page, WebDriverPage};
use crate::config::AgentConfig;
use crate::errors::AgentError;
use crate::executor::attach::attach_files;
use crate::executor::fill_fields;
use crate::executor::screenshots::{capture, Checkpoint};

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub screenshot_dir: PathBuf,
    pub navigation_timeout: Duration,
    pub field_timeout: Duration,
    /// Recorded in the log only; it changes nothing about what the run does.
    pub submit_override_requested: bool,
}

impl From<&AgentConfig> for RunSettings {
    fn from(config: &AgentConfig) -> Self {
        Self {
            screenshot_dir: config.screenshot_dir.clone(),
            navigation_timeout: config.navigation_timeout,
            field_timeout: config.field_timeout,
            submit_override_requested: !config.stop_before_submit,
        }
    }
}

/// The finished log and what the API made of it.
#[derive(Debug)]
pub struct RunOutcome {
    pub log: PrefillLog,
    pub ack: Result<ReportResultResponse, AgentError>,
}

async fn navigate(page: &dyn Page, url: &str, limit: Duration) -> Result<(), AgentError> {
    match tokio::time::timeout(limit, page.goto(url)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(AgentError::NavigationFailed(e.to_string())),
        Err(_) => Err(AgentError::NavigationFailed(format!(
            "{url} did not load within {}s",
            limit.as_secs()
        ))),
    }
}

/// Runs the browser half of the pipeline against an already-open page.
/// Errors only when the job page cannot be loaded.
pub async fn execute(
    page: &dyn Page,
    registry: &AdapterRegistry,
    intent: &IntentPayload,
    settings: &RunSettings,
) -> Result<PrefillLog, AgentError> {
    let started = Instant::now();
    let dir = settings.screenshot_dir.as_path();
    let mut screenshots = Vec::new();

    info!("Opening {}", intent.job_url);
    navigate(page, &intent.job_url, settings.navigation_timeout).await?;
    screenshots.extend(capture(page, dir, intent.intent_id, Checkpoint::Initial).await);

    let selection = registry.detect_best(page).await;
    let fields = selection.adapter.plan_fields(&intent.user_fields);
    let field_run = fill_fields(page, selection.adapter, &fields, settings.field_timeout).await;
    screenshots.extend(capture(page, dir, intent.intent_id, Checkpoint::PostFill).await);

    let attachment_run = attach_files(
        page,
        selection.adapter,
        &intent.attachments,
        settings.field_timeout,
    )
    .await;
    screenshots.extend(capture(page, dir, intent.intent_id, Checkpoint::PostAttachment).await);

    Ok(PrefillLog {
        intent_id: intent.intent_id,
        detected_ats: Some(selection.result.ats),
        detection_confidence: selection.result.confidence,
        matched_signals: selection.result.matched_signals,
        filled_fields: field_run.results,
        missing_fields: field_run.missing,
        resume_attached: attachment_run.resume_attached,
        attachment_errors: attachment_run.errors,
        screenshot_paths: screenshots
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect(),
        duration_seconds: started.elapsed().as_secs_f64(),
        stopped_before_submit: true,
        submit_override_requested: settings.submit_override_requested,
        fatal_error: None,
        field_mappings: field_run.mappings,
        timestamp: Utc::now(),
    })
}

async fn report_failure(
    api: &ApiClient,
    intent_id: Uuid,
    token: &AuthToken,
    settings: &RunSettings,
    cause: &AgentError,
) {
    let mut log = PrefillLog::failure(intent_id, cause.to_string(), Utc::now());
    log.submit_override_requested = settings.submit_override_requested;
    match api.report_result(intent_id, token, &log).await {
        Ok(ack) => info!("Failure recorded as log {}", ack.log_id),
        Err(e) => warn!("Could not record the failure: {e}"),
    }
}

pub async fn run(
    config: &AgentConfig,
    intent_id: Uuid,
    token: AuthToken,
) -> Result<RunOutcome, AgentError> {
    let settings = RunSettings::from(config);
    if settings.submit_override_requested {
        error!("================================================================");
        error!("STOP_BEFORE_SUBMIT=false was requested. The agent never submits;");
        error!("the form will be left filled for you to review and submit.");
        error!("================================================================");
    }

    let api = ApiClient::new(config.api_url.clone())?;
    let intent = api.fetch_intent(intent_id, &token).await?;
    info!(
        "Fetched intent {intent_id} for {} ({} fields)",
        intent.job_url,
        intent.user_fields.len()
    );

    let page = match WebDriverPage::launch(&config.webdriver_url, config.headless).await {
        Ok(page) => page,
        Err(e) => {
            let err = AgentError::BrowserLaunch(e.to_string());
            report_failure(&api, intent_id, &token, &settings, &err).await;
            return Err(err);
        }
    };

    let registry = AdapterRegistry::standard();
    let log = match execute(&page, &registry, &intent, &settings).await {
        Ok(log) => log,
        Err(err) => {
            report_failure(&api, intent_id, &token, &settings, &err).await;
            if let Err(e) = page.close().await {
                warn!("Could not close browser: {e}");
            }
            return Err(err);
        }
    };

    if config.headless {
        if let Err(e) = page.close().await {
            warn!("Could not close browser: {e}");
        }
    } else if let Err(e) = page.leave_open().await {
        warn!("Could not keep the browser open: {e}");
    }

    let ack = api.report_result(intent_id, &token, &log).await;
    match &ack {
        Ok(ack) => info!("Reported log {} for intent {intent_id}", ack.log_id),
        Err(e) => error!("Prefill log was not recorded: {e}"),
    }
    Ok(RunOutcome { log, ack })
}
