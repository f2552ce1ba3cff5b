use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{info, warn};

use crate::adapters::AtsAdapter;
use crate::browser::{ControlKind, Locator, Page};

const RESUME_PATTERNS: &[&str] = &[
    "input[type=\"file\"][name*=\"resume\" i]",
    "input[type=\"file\"][id*=\"resume\" i]",
    "input[type=\"file\"][name*=\"cv\" i]",
    "input[type=\"file\"][id*=\"cv\" i]",
];

/// Last resort: a page with exactly one file input.
const ANY_FILE_INPUT: &str = "input[type=\"file\"]";

#[derive(Debug, Default, PartialEq)]
pub struct AttachmentRun {
    pub resume_attached: bool,
    pub errors: Vec<String>,
}

fn selectors_for(adapter: &dyn AtsAdapter, name: &str) -> Vec<String> {
    let mut selectors: Vec<String> = Vec::new();
    if name == "resume" {
        selectors.extend(adapter.resume_selectors().iter().map(|s| s.to_string()));
        selectors.extend(RESUME_PATTERNS.iter().map(|s| s.to_string()));
    } else {
        selectors.push(format!("input[type=\"file\"][name*=\"{name}\" i]"));
        selectors.push(format!("input[type=\"file\"][id*=\"{name}\" i]"));
    }
    selectors.push(ANY_FILE_INPUT.to_string());
    selectors
}

async fn upload_one(
    page: &dyn Page,
    adapter: &dyn AtsAdapter,
    name: &str,
    path: &Path,
) -> Result<(), String> {
    let path: PathBuf = tokio::fs::canonicalize(path)
        .await
        .map_err(|_| format!("{name}: file not found: {}", path.display()))?;

    for selector in selectors_for(adapter, name) {
        let controls = match page.query(&Locator::Css(selector.clone())).await {
            Ok(controls) => controls,
            Err(e) => {
                warn!("Lookup {selector} for attachment {name} failed: {e}");
                continue;
            }
        };
        let files: Vec<_> = controls
            .into_iter()
            .filter(|c| c.kind == ControlKind::File)
            .collect();
        if let [control] = files.as_slice() {
            return page
                .upload(control.handle, &path)
                .await
                .map(|()| info!("Attached {name} via {selector}"))
                .map_err(|e| format!("{name}: upload failed: {e}"));
        }
    }
    Err(format!("{name}: no file input found"))
}

/// Uploads every attachment, each under its own timeout. Failures are
/// collected, never raised.
pub async fn attach_files(
    page: &dyn Page,
    adapter: &dyn AtsAdapter,
    attachments: &BTreeMap<String, String>,
    per_attachment_timeout: Duration,
) -> AttachmentRun {
    let mut run = AttachmentRun::default();

    for (name, path) in attachments {
        let attempt = tokio::time::timeout(
            per_attachment_timeout,
            upload_one(page, adapter, name, Path::new(path)),
        )
        .await
        .unwrap_or_else(|_| Err(format!("{name}: timed out")));

        match attempt {
            Ok(()) if name == "resume" => run.resume_attached = true,
            Ok(()) => {}
            Err(e) => {
                warn!("Attachment failed: {e}");
                run.errors.push(e);
            }
        }
    }
    run
}
