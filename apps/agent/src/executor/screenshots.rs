use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::browser::Page;

/// The three fixed audit checkpoints of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint {
    Initial,
    PostFill,
    PostAttachment,
}

impl Checkpoint {
    pub fn index(&self) -> u8 {
        match self {
            Checkpoint::Initial => 1,
            Checkpoint::PostFill => 2,
            Checkpoint::PostAttachment => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Checkpoint::Initial => "initial",
            Checkpoint::PostFill => "post_fill",
            Checkpoint::PostAttachment => "post_attachment",
        }
    }
}

pub fn screenshot_path(dir: &Path, intent_id: Uuid, checkpoint: Checkpoint) -> PathBuf {
    dir.join(format!(
        "prefill_{intent_id}_{}_{}.png",
        checkpoint.index(),
        checkpoint.as_str()
    ))
}

/// Saves a screenshot for the checkpoint. Returns `None` on any failure.
pub async fn capture(
    page: &dyn Page,
    dir: &Path,
    intent_id: Uuid,
    checkpoint: Checkpoint,
) -> Option<PathBuf> {
    let path = screenshot_path(dir, intent_id, checkpoint);
    let result = async {
        let png = page.screenshot().await.map_err(|e| e.to_string())?;
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| e.to_string())?;
        tokio::fs::write(&path, png).await.map_err(|e| e.to_string())
    }
    .await;

    match result {
        Ok(()) => {
            debug!("Saved {} screenshot to {}", checkpoint.as_str(), path.display());
            Some(path)
        }
        Err(e) => {
            warn!("Skipped {} screenshot: {e}", checkpoint.as_str());
            None
        }
    }
}
