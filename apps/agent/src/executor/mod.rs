//! Field-Fill Executor.
//!
//! Every field is attempted in isolation and ends as a `FieldOutcome`; nothing
//! a single field does can stop the others. The executor only types, selects
//! and uploads through `Page`, which has no way to submit.

pub mod attach;
pub mod resolve;
pub mod screenshots;

use std::collections::BTreeMap;
use std::time::Duration;

use prefill_protocol::{FieldMappingRecord, FillResult};
use tracing::{info, warn};

use crate::adapters::AtsAdapter;
use crate::browser::{strip_key_codes, ControlKind, Page};

use resolve::{resolve_field, ResolvedField};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldOutcome {
    Filled,
    Missing,
    Failed(String),
}

/// Aggregated result of filling every planned field.
#[derive(Debug, Default)]
pub struct FieldRun {
    pub results: Vec<FillResult>,
    pub missing: Vec<String>,
    pub mappings: BTreeMap<String, FieldMappingRecord>,
}

impl FieldRun {
    fn record(&mut self, field: &str, value: &str, outcome: FieldOutcome) {
        match outcome {
            FieldOutcome::Missing => self.missing.push(field.to_string()),
            FieldOutcome::Filled => self.results.push(FillResult {
                field_name: field.to_string(),
                value: value.to_string(),
                success: true,
                error: None,
            }),
            FieldOutcome::Failed(error) => self.results.push(FillResult {
                field_name: field.to_string(),
                value: value.to_string(),
                success: false,
                error: Some(error),
            }),
        }
    }
}

/// Strips anything that would type a key press. WebDriver key codes go for
/// every control; single-line controls also lose newlines, since Enter in an
/// `<input>` submits its form.
pub fn sanitize_value(kind: ControlKind, value: &str) -> String {
    let value = strip_key_codes(value);
    match kind {
        ControlKind::TextArea => value,
        _ => value
            .split(['\r', '\n'])
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

async fn set_value(page: &dyn Page, resolved: &ResolvedField, value: &str) -> FieldOutcome {
    let kind = resolved.control.kind;
    let value = sanitize_value(kind, value);
    let result = match kind {
        ControlKind::Text | ControlKind::TextArea => page.fill(resolved.control.handle, &value).await,
        ControlKind::Select => page.select(resolved.control.handle, &value).await,
        ControlKind::File => {
            return FieldOutcome::Failed("resolved to a file input".to_string());
        }
    };
    match result {
        Ok(()) => FieldOutcome::Filled,
        Err(e) => FieldOutcome::Failed(e.to_string()),
    }
}

async fn fill_one(
    page: &dyn Page,
    adapter: &dyn AtsAdapter,
    field: &str,
    value: &str,
) -> (FieldOutcome, Option<ResolvedField>) {
    let Some(resolved) = resolve_field(page, adapter, field).await else {
        return (FieldOutcome::Missing, None);
    };
    let outcome = set_value(page, &resolved, value).await;
    (outcome, Some(resolved))
}

/// Fills `fields` in order, each under its own timeout.
pub async fn fill_fields(
    page: &dyn Page,
    adapter: &dyn AtsAdapter,
    fields: &[(String, String)],
    per_field_timeout: Duration,
) -> FieldRun {
    let mut run = FieldRun::default();

    for (field, value) in fields {
        let (outcome, resolved) =
            match tokio::time::timeout(per_field_timeout, fill_one(page, adapter, field, value))
                .await
            {
                Ok(done) => done,
                Err(_) => (
                    FieldOutcome::Failed(format!(
                        "timed out after {}s",
                        per_field_timeout.as_secs_f64()
                    )),
                    None,
                ),
            };

        match &outcome {
            FieldOutcome::Filled => {}
            FieldOutcome::Missing => info!("Field {field}: no matching control"),
            FieldOutcome::Failed(e) => warn!("Field {field}: could not set value: {e}"),
        }
        if let Some(resolved) = resolved {
            run.mappings.insert(
                field.clone(),
                FieldMappingRecord {
                    locator: resolved.locator.to_string(),
                    strategy: resolved.strategy.as_str().to_string(),
                    kind: resolved.control.kind.as_str().to_string(),
                },
            );
        }
        run.record(field, value, outcome);
    }

    info!(
        "Filled {} fields, {} missing, {} failed",
        run.results.iter().filter(|r| r.success).count(),
        run.missing.len(),
        run.results.iter().filter(|r| !r.success).count()
    );
    run
}
