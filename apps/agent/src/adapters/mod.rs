//! ATS classification and the adapter registry.
//!
//! Every adapter scores the live page independently. A specialized adapter
//! declares weighted signals (URL substring, form identifier, vendor branding,
//! characteristic field); its confidence is the sum of the matched weights,
//! capped at 1.0. Form and branding references weigh no more than the
//! fallback floor, so one of them alone never selects a vendor. The registry
//! picks the strictly highest score, ties going to the earlier-registered
//! adapter, and the fallback wins unless something beats its fixed floor.

pub mod generic;
pub mod greenhouse;
pub mod lever;
pub mod linkedin;
pub mod workday;

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::browser::{BrowserError, Page};

pub use generic::GenericAdapter;
pub use greenhouse::GreenhouseAdapter;
pub use lever::LeverAdapter;
pub use linkedin::LinkedInAdapter;
pub use workday::WorkdayAdapter;

#[derive(Debug, Clone, Copy)]
pub enum SignalKind {
    /// Substring of the page URL.
    Url(&'static str),
    /// CSS selector for a form or container that identifies the vendor.
    Form(&'static str),
    /// Substring of the page source, compared case-insensitively.
    Branding(&'static str),
    /// CSS selector for a field only this vendor renders.
    Field(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct Signal {
    pub kind: SignalKind,
    pub weight: f64,
}

impl Signal {
    pub const fn url(pattern: &'static str, weight: f64) -> Self {
        Self { kind: SignalKind::Url(pattern), weight }
    }

    pub const fn form(selector: &'static str, weight: f64) -> Self {
        Self { kind: SignalKind::Form(selector), weight }
    }

    pub const fn branding(needle: &'static str, weight: f64) -> Self {
        Self { kind: SignalKind::Branding(needle), weight }
    }

    pub const fn field(selector: &'static str, weight: f64) -> Self {
        Self { kind: SignalKind::Field(selector), weight }
    }

    fn describe(&self) -> String {
        match self.kind {
            SignalKind::Url(p) => format!("url:{p}"),
            SignalKind::Form(s) => format!("form:{s}"),
            SignalKind::Branding(b) => format!("branding:{b}"),
            SignalKind::Field(s) => format!("field:{s}"),
        }
    }
}

/// What detection reads once per page, shared by all adapters.
#[derive(Debug, Clone, Default)]
pub struct PageSnapshot {
    pub url: String,
    /// Page source, lowercased.
    pub html: String,
}

impl PageSnapshot {
    pub async fn capture(page: &dyn Page) -> Self {
        let url = page.url().await.unwrap_or_else(|e| {
            warn!("Could not read page URL for detection: {e}");
            String::new()
        });
        let html = page.html().await.unwrap_or_else(|e| {
            warn!("Could not read page source for detection: {e}");
            String::new()
        });
        Self {
            url: url.to_lowercase(),
            html: html.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub confidence: f64,
    pub signals: Vec<String>,
}

impl Detection {
    pub fn none() -> Self {
        Self {
            confidence: 0.0,
            signals: vec![],
        }
    }
}

/// Classification outcome for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub ats: String,
    pub confidence: f64,
    pub matched_signals: Vec<String>,
}

/// Sums the weights of every matched signal, capped at 1.0.
pub async fn score_signals(
    signals: &[Signal],
    page: &dyn Page,
    snapshot: &PageSnapshot,
) -> Result<Detection, BrowserError> {
    let mut detection = Detection::none();
    for signal in signals {
        let matched = match signal.kind {
            SignalKind::Url(pattern) => snapshot.url.contains(pattern),
            SignalKind::Branding(needle) => snapshot.html.contains(needle),
            SignalKind::Form(css) | SignalKind::Field(css) => page.count(css).await? > 0,
        };
        if matched {
            detection.confidence += signal.weight;
            detection.signals.push(signal.describe());
        }
    }
    detection.confidence = detection.confidence.min(1.0);
    Ok(detection)
}

/// One form-handling strategy. Adding ATS support means adding an implementor,
/// never changing an existing one.
#[async_trait]
pub trait AtsAdapter: Send + Sync {
    fn id(&self) -> &'static str;

    fn signals(&self) -> &'static [Signal] {
        &[]
    }

    async fn detect(&self, page: &dyn Page, snapshot: &PageSnapshot) -> Result<Detection, BrowserError> {
        score_signals(self.signals(), page, snapshot).await
    }

    /// Vendor selectors for a canonical field, most specific first.
    fn field_selectors(&self, _field: &str) -> &'static [&'static str] {
        &[]
    }

    fn resume_selectors(&self) -> &'static [&'static str] {
        &[]
    }

    /// Whether the vendor's form asks for given and family name separately.
    fn splits_name(&self) -> bool {
        false
    }

    /// The (field, value) pairs to fill, in a stable order.
    fn plan_fields(&self, user_fields: &BTreeMap<String, String>) -> Vec<(String, String)> {
        let mut planned = Vec::with_capacity(user_fields.len() + 1);
        for (field, value) in user_fields {
            if field == "name" && self.splits_name() {
                let (first, last) = split_name(value);
                planned.push(("first_name".to_string(), first.to_string()));
                if !last.is_empty() {
                    planned.push(("last_name".to_string(), last.to_string()));
                }
            } else {
                planned.push((field.clone(), value.clone()));
            }
        }
        planned
    }
}

/// Splits on the first whitespace: "Ada King Lovelace" → ("Ada", "King Lovelace").
pub fn split_name(full: &str) -> (&str, &str) {
    let full = full.trim();
    match full.split_once(char::is_whitespace) {
        Some((first, rest)) => (first, rest.trim()),
        None => (full, ""),
    }
}

/// The chosen adapter for a page, with its detection result.
pub struct Selection<'a> {
    pub adapter: &'a dyn AtsAdapter,
    pub result: DetectionResult,
}

/// Ordered, immutable set of adapters. Order is significant: it breaks ties.
pub struct AdapterRegistry {
    specialized: Vec<Box<dyn AtsAdapter>>,
    fallback: Box<dyn AtsAdapter>,
}

impl AdapterRegistry {
    pub fn new(specialized: Vec<Box<dyn AtsAdapter>>, fallback: Box<dyn AtsAdapter>) -> Self {
        Self {
            specialized,
            fallback,
        }
    }

    pub fn standard() -> Self {
        Self::new(
            vec![
                Box::new(GreenhouseAdapter),
                Box::new(LeverAdapter),
                Box::new(WorkdayAdapter),
                Box::new(LinkedInAdapter),
            ],
            Box::new(GenericAdapter),
        )
    }

    async fn score(adapter: &dyn AtsAdapter, page: &dyn Page, snapshot: &PageSnapshot) -> Detection {
        match adapter.detect(page, snapshot).await {
            Ok(mut detection) => {
                detection.confidence = detection.confidence.clamp(0.0, 1.0);
                detection
            }
            Err(e) => {
                warn!("Adapter {} failed during detection: {e}", adapter.id());
                Detection::none()
            }
        }
    }

    pub async fn detect_best(&self, page: &dyn Page) -> Selection<'_> {
        let snapshot = PageSnapshot::capture(page).await;

        let mut best: &dyn AtsAdapter = self.fallback.as_ref();
        let mut best_detection = Self::score(best, page, &snapshot).await;

        for adapter in &self.specialized {
            let detection = Self::score(adapter.as_ref(), page, &snapshot).await;
            debug!(
                "Adapter {} scored {:.2} ({:?})",
                adapter.id(),
                detection.confidence,
                detection.signals
            );
            if detection.confidence > best_detection.confidence {
                best = adapter.as_ref();
                best_detection = detection;
            }
        }

        info!(
            "Detected ATS {} with confidence {:.2}",
            best.id(),
            best_detection.confidence
        );
        Selection {
            adapter: best,
            result: DetectionResult {
                ats: best.id().to_string(),
                confidence: best_detection.confidence,
                matched_signals: best_detection.signals,
            },
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::browser::fake::{FakeControl, FakePage};

    pub struct FixedAdapter {
        pub id: &'static str,
        pub confidence: f64,
    }

    #[async_trait]
    impl AtsAdapter for FixedAdapter {
        fn id(&self) -> &'static str {
            self.id
        }

        async fn detect(&self, _: &dyn Page, _: &PageSnapshot) -> Result<Detection, BrowserError> {
            Ok(Detection {
                confidence: self.confidence,
                signals: vec![format!("fixed:{}", self.id)],
            })
        }
    }

    struct BrokenAdapter;

    #[async_trait]
    impl AtsAdapter for BrokenAdapter {
        fn id(&self) -> &'static str {
            "broken"
        }

        async fn detect(&self, _: &dyn Page, _: &PageSnapshot) -> Result<Detection, BrowserError> {
            Err(BrowserError::Command("detached frame".to_string()))
        }
    }

    fn fixed(id: &'static str, confidence: f64) -> Box<dyn AtsAdapter> {
        Box::new(FixedAdapter { id, confidence })
    }

    async fn loaded(page: FakePage) -> FakePage {
        page.goto("https://example.com/apply").await.unwrap();
        page
    }

    #[tokio::test]
    async fn test_equal_confidence_goes_to_earliest_registered() {
        let page = loaded(FakePage::new("https://example.com/apply")).await;
        let registry = AdapterRegistry::new(
            vec![fixed("first", 0.6), fixed("second", 0.6), fixed("third", 0.3)],
            Box::new(GenericAdapter),
        );
        for _ in 0..10 {
            assert_eq!(registry.detect_best(&page).await.result.ats, "first");
        }
    }

    #[tokio::test]
    async fn test_fallback_wins_at_or_below_floor() {
        let page = loaded(FakePage::new("https://example.com/apply")).await;
        let registry = AdapterRegistry::new(
            vec![fixed("weak", 0.1), fixed("weaker", 0.05)],
            Box::new(GenericAdapter),
        );
        let selection = registry.detect_best(&page).await;
        assert_eq!(selection.result.ats, "generic");
        assert_eq!(selection.result.confidence, 0.1);
    }

    #[tokio::test]
    async fn test_partial_match_beats_fallback() {
        let page = loaded(FakePage::new("https://example.com/apply")).await;
        let registry =
            AdapterRegistry::new(vec![fixed("partial", 0.2)], Box::new(GenericAdapter));
        assert_eq!(registry.detect_best(&page).await.result.ats, "partial");
    }

    #[tokio::test]
    async fn test_failing_adapter_is_isolated() {
        let page = loaded(FakePage::new("https://example.com/apply")).await;
        let registry = AdapterRegistry::new(
            vec![Box::new(BrokenAdapter), fixed("healthy", 0.4)],
            Box::new(GenericAdapter),
        );
        assert_eq!(registry.detect_best(&page).await.result.ats, "healthy");
    }

    #[tokio::test]
    async fn test_overconfident_adapter_is_clamped() {
        let page = loaded(FakePage::new("https://example.com/apply")).await;
        let registry = AdapterRegistry::new(vec![fixed("loud", 3.0)], Box::new(GenericAdapter));
        assert_eq!(registry.detect_best(&page).await.result.confidence, 1.0);
    }

    #[tokio::test]
    async fn test_greenhouse_url_and_field_score_point_eight() {
        let page = loaded(
            FakePage::new("https://boards.greenhouse.io/babbage/jobs/1")
                .control(FakeControl::text().css("#first_name"))
                .control(FakeControl::text().css("#email")),
        )
        .await;
        let registry = AdapterRegistry::standard();
        let selection = registry.detect_best(&page).await;
        assert_eq!(selection.result.ats, "greenhouse");
        assert!((selection.result.confidence - 0.8).abs() < 1e-9);
        assert_eq!(
            selection.result.matched_signals,
            vec!["url:greenhouse.io".to_string(), "field:#first_name".to_string()]
        );
    }

    #[tokio::test]
    async fn test_every_greenhouse_signal_adds_up_to_one() {
        let page = loaded(
            FakePage::new("https://boards.greenhouse.io/babbage/jobs/1")
                .with_html("<div id=\"grnhse_app\"></div>")
                .marker("#application_form")
                .control(FakeControl::text().css("#first_name")),
        )
        .await;
        let registry = AdapterRegistry::standard();
        let selection = registry.detect_best(&page).await;
        assert_eq!(selection.result.confidence, 1.0);
        assert_eq!(selection.result.matched_signals.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_page_falls_back_to_generic() {
        let page = loaded(
            FakePage::new("https://careers.example.com/apply")
                .control(FakeControl::text().label("Name")),
        )
        .await;
        let registry = AdapterRegistry::standard();
        let selection = registry.detect_best(&page).await;
        assert_eq!(selection.result.ats, "generic");
    }

    #[tokio::test]
    async fn test_lone_branding_mention_stays_generic() {
        let page = loaded(
            FakePage::new("https://careers.example.com/apply")
                .with_html("<p>You will maintain our Workday integration.</p>")
                .control(FakeControl::text().label("Name")),
        )
        .await;
        let registry = AdapterRegistry::standard();
        let selection = registry.detect_best(&page).await;
        assert_eq!(selection.result.ats, "generic");
        assert_eq!(selection.result.confidence, 0.1);
    }

    #[tokio::test]
    async fn test_lone_form_marker_stays_generic() {
        let page = loaded(
            FakePage::new("https://careers.example.com/apply")
                .marker(".jobs-easy-apply-modal"),
        )
        .await;
        let registry = AdapterRegistry::standard();
        assert_eq!(registry.detect_best(&page).await.result.ats, "generic");
    }

    #[tokio::test]
    async fn test_two_weak_signals_together_beat_fallback() {
        let page = loaded(
            FakePage::new("https://careers.example.com/apply")
                .with_html("<div data-automation-id=\"applyFlowPage\">Powered by Workday</div>")
                .marker("[data-automation-id=\"applyFlowPage\"]"),
        )
        .await;
        let registry = AdapterRegistry::standard();
        let selection = registry.detect_best(&page).await;
        assert_eq!(selection.result.ats, "workday");
        assert_eq!(selection.result.matched_signals.len(), 2);
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("Ada Lovelace"), ("Ada", "Lovelace"));
        assert_eq!(split_name("  Ada  King Lovelace "), ("Ada", "King Lovelace"));
        assert_eq!(split_name("Ada"), ("Ada", ""));
    }

    #[test]
    fn test_plan_fields_splits_name_only_for_split_forms() {
        let fields: BTreeMap<String, String> = [
            ("name".to_string(), "Ada Lovelace".to_string()),
            ("email".to_string(), "ada@example.com".to_string()),
        ]
        .into_iter()
        .collect();

        let split = GreenhouseAdapter.plan_fields(&fields);
        assert_eq!(
            split,
            vec![
                ("email".to_string(), "ada@example.com".to_string()),
                ("first_name".to_string(), "Ada".to_string()),
                ("last_name".to_string(), "Lovelace".to_string()),
            ]
        );

        let whole = GenericAdapter.plan_fields(&fields);
        assert!(whole.contains(&("name".to_string(), "Ada Lovelace".to_string())));
    }
}
