use async_trait::async_trait;

use super::{AtsAdapter, Detection, PageSnapshot};
use crate::browser::{BrowserError, Page};

/// Fixed floor every specialized adapter must beat.
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Matches nothing in particular. Fields are found through the generic
/// name, label, placeholder and accessible-name strategies alone.
pub struct GenericAdapter;

#[async_trait]
impl AtsAdapter for GenericAdapter {
    fn id(&self) -> &'static str {
        "generic"
    }

    async fn detect(&self, _: &dyn Page, _: &PageSnapshot) -> Result<Detection, BrowserError> {
        Ok(Detection {
            confidence: FALLBACK_CONFIDENCE,
            signals: vec!["fallback".to_string()],
        })
    }
}
