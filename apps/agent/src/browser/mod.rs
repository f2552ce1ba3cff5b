//! The browser surface the fill pipeline is allowed to touch.
//!
//! `Page` exposes reading, locating, typing, selecting and file upload. It has
//! no click, key-press or submit operation, so nothing built on it can submit a
//! form. Interactive lookups never return submit, button, reset, image or
//! hidden controls.

pub mod webdriver;

#[cfg(test)]
pub mod fake;

use std::fmt;
use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

pub use webdriver::WebDriverPage;

#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("could not start browser session: {0}")]
    Launch(String),

    #[error("navigation failed: {0}")]
    Navigation(String),

    #[error("browser command failed: {0}")]
    Command(String),

    #[error("control handle {0} is no longer valid")]
    StaleHandle(usize),
}

/// How a form control is looked up on the live page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// CSS selector, as published by an ATS adapter.
    Css(String),
    /// `name` attribute equal to the value, ignoring case.
    NameAttr(String),
    /// Control associated with a `<label>` whose text starts with the value, ignoring case.
    LabelText(String),
    /// `placeholder` containing the value, ignoring case.
    Placeholder(String),
    /// `aria-label` containing the value, ignoring case.
    AccessibleName(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Css(s) => write!(f, "css:{s}"),
            Locator::NameAttr(s) => write!(f, "name:{s}"),
            Locator::LabelText(s) => write!(f, "label:{s}"),
            Locator::Placeholder(s) => write!(f, "placeholder:{s}"),
            Locator::AccessibleName(s) => write!(f, "aria-label:{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Text,
    TextArea,
    Select,
    File,
}

impl ControlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Text => "text",
            ControlKind::TextArea => "textarea",
            ControlKind::Select => "select",
            ControlKind::File => "file",
        }
    }

    /// Classifies a tag and `type` attribute. `None` for anything the agent
    /// must not interact with.
    pub fn classify(tag: &str, input_type: Option<&str>) -> Option<Self> {
        match tag.to_ascii_lowercase().as_str() {
            "textarea" => Some(ControlKind::TextArea),
            "select" => Some(ControlKind::Select),
            "input" => {
                let input_type = input_type.unwrap_or("text").to_ascii_lowercase();
                match input_type.as_str() {
                    "submit" | "button" | "image" | "reset" | "hidden" | "checkbox" | "radio" => {
                        None
                    }
                    "file" => Some(ControlKind::File),
                    _ => Some(ControlKind::Text),
                }
            }
            _ => None,
        }
    }
}

/// WebDriver `send_keys` reads Private Use Area characters as special keys
/// (U+E006 is Return, U+E007 is Enter).
const KEY_CODES: std::ops::RangeInclusive<char> = '\u{E000}'..='\u{F8FF}';

pub fn has_key_codes(text: &str) -> bool {
    text.chars().any(|c| KEY_CODES.contains(&c))
}

/// Removes every character WebDriver would turn into a key press.
pub fn strip_key_codes(text: &str) -> String {
    text.chars().filter(|c| !KEY_CODES.contains(c)).collect()
}

/// Opaque reference to a control found by `Page::query`, valid for the life of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Control {
    pub handle: ControlHandle,
    pub kind: ControlKind,
}

#[async_trait]
pub trait Page: Send + Sync {
    async fn goto(&self, url: &str) -> Result<(), BrowserError>;

    async fn url(&self) -> Result<String, BrowserError>;

    async fn html(&self) -> Result<String, BrowserError>;

    /// Number of elements of any kind matching a CSS selector.
    async fn count(&self, css: &str) -> Result<usize, BrowserError>;

    /// Interactive controls matching the locator, in document order.
    async fn query(&self, locator: &Locator) -> Result<Vec<Control>, BrowserError>;

    /// Replaces a text control's value.
    async fn fill(&self, control: ControlHandle, value: &str) -> Result<(), BrowserError>;

    /// Picks an option by visible label, falling back to its value.
    async fn select(&self, control: ControlHandle, value: &str) -> Result<(), BrowserError>;

    async fn upload(&self, control: ControlHandle, path: &Path) -> Result<(), BrowserError>;

    /// PNG bytes of the current viewport.
    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_like_inputs_are_not_interactive() {
        for t in ["submit", "button", "image", "reset", "hidden", "SUBMIT"] {
            assert_eq!(ControlKind::classify("input", Some(t)), None, "{t}");
        }
        assert_eq!(ControlKind::classify("button", None), None);
        assert_eq!(ControlKind::classify("a", None), None);
    }

    #[test]
    fn test_classify_fillable_controls() {
        assert_eq!(ControlKind::classify("INPUT", None), Some(ControlKind::Text));
        assert_eq!(ControlKind::classify("input", Some("email")), Some(ControlKind::Text));
        assert_eq!(ControlKind::classify("input", Some("file")), Some(ControlKind::File));
        assert_eq!(ControlKind::classify("textarea", None), Some(ControlKind::TextArea));
        assert_eq!(ControlKind::classify("select", None), Some(ControlKind::Select));
    }

    #[test]
    fn test_key_codes_are_removed() {
        assert_eq!(strip_key_codes("ada@example.com\u{E007}"), "ada@example.com");
        assert_eq!(strip_key_codes("\u{E006}Ada\u{E000}\u{F8FF}"), "Ada");
        assert_eq!(strip_key_codes("Zoë 😀"), "Zoë 😀");
        assert!(has_key_codes("/tmp/cv\u{E007}.pdf"));
        assert!(!has_key_codes("/tmp/cv.pdf"));
    }

    #[test]
    fn test_locator_display_names_strategy() {
        assert_eq!(Locator::Css("#email".into()).to_string(), "css:#email");
        assert_eq!(Locator::LabelText("name".into()).to_string(), "label:name");
    }
}
