//! In-memory `Page` for pipeline tests. Controls declare which locators find
//! them; every interaction is recorded.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{BrowserError, Control, ControlHandle, ControlKind, Locator, Page};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Goto(String),
    Fill { control: usize, value: String },
    Select { control: usize, value: String },
    Upload { control: usize, path: String },
    Screenshot,
}

#[derive(Debug, Clone)]
pub struct FakeControl {
    pub kind: ControlKind,
    pub css: Vec<String>,
    pub name: Option<String>,
    pub label: Option<String>,
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    pub interactive: bool,
    pub fail_with: Option<String>,
}

impl FakeControl {
    pub fn new(kind: ControlKind) -> Self {
        Self {
            kind,
            css: vec![],
            name: None,
            label: None,
            placeholder: None,
            aria_label: None,
            interactive: true,
            fail_with: None,
        }
    }

    pub fn text() -> Self {
        Self::new(ControlKind::Text)
    }

    pub fn file() -> Self {
        Self::new(ControlKind::File)
    }

    pub fn css(mut self, selector: &str) -> Self {
        self.css.push(selector.to_string());
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn placeholder(mut self, placeholder: &str) -> Self {
        self.placeholder = Some(placeholder.to_string());
        self
    }

    pub fn aria_label(mut self, aria_label: &str) -> Self {
        self.aria_label = Some(aria_label.to_string());
        self
    }

    /// A submit button: present in the DOM, never returned as interactive.
    pub fn submit_button() -> Self {
        let mut control = Self::text().css("button[type=submit]").label("Submit");
        control.interactive = false;
        control
    }

    pub fn failing(mut self, message: &str) -> Self {
        self.fail_with = Some(message.to_string());
        self
    }

    fn matches(&self, locator: &Locator) -> bool {
        let contains = |field: &Option<String>, needle: &str| {
            field
                .as_deref()
                .is_some_and(|v| v.to_lowercase().contains(&needle.to_lowercase()))
        };
        match locator {
            Locator::Css(css) => self.css.iter().any(|c| c == css),
            Locator::NameAttr(name) => self
                .name
                .as_deref()
                .is_some_and(|n| n.eq_ignore_ascii_case(name)),
            Locator::LabelText(text) => self.label.as_deref().is_some_and(|l| {
                l.trim()
                    .to_lowercase()
                    .starts_with(&text.trim().to_lowercase())
            }),
            Locator::Placeholder(text) => contains(&self.placeholder, text),
            Locator::AccessibleName(text) => contains(&self.aria_label, text),
        }
    }
}

#[derive(Default)]
struct State {
    actions: Vec<Action>,
    url: String,
}

pub struct FakePage {
    url: String,
    html: String,
    markers: Vec<String>,
    controls: Vec<FakeControl>,
    broken_locators: Vec<Locator>,
    fail_navigation: Option<String>,
    fail_screenshots: bool,
    state: Mutex<State>,
}

impl FakePage {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            html: "<html><body><form></form></body></html>".to_string(),
            markers: vec![],
            controls: vec![],
            broken_locators: vec![],
            fail_navigation: None,
            fail_screenshots: false,
            state: Mutex::new(State::default()),
        }
    }

    pub fn with_html(mut self, html: &str) -> Self {
        self.html = html.to_string();
        self
    }

    /// A non-interactive element matching `css`, for detection signals.
    pub fn marker(mut self, css: &str) -> Self {
        self.markers.push(css.to_string());
        self
    }

    pub fn control(mut self, control: FakeControl) -> Self {
        self.controls.push(control);
        self
    }

    pub fn broken_locator(mut self, locator: Locator) -> Self {
        self.broken_locators.push(locator);
        self
    }

    pub fn unreachable(mut self, message: &str) -> Self {
        self.fail_navigation = Some(message.to_string());
        self
    }

    pub fn without_screenshots(mut self) -> Self {
        self.fail_screenshots = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.state().actions.clone()
    }

    pub fn filled_value(&self, control: usize) -> Option<String> {
        self.state().actions.iter().rev().find_map(|a| match a {
            Action::Fill { control: c, value } | Action::Select { control: c, value }
                if *c == control =>
            {
                Some(value.clone())
            }
            _ => None,
        })
    }

    fn control_at(&self, handle: ControlHandle) -> Result<&FakeControl, BrowserError> {
        self.controls
            .get(handle.0)
            .ok_or(BrowserError::StaleHandle(handle.0))
    }

    fn record(&self, handle: ControlHandle, action: Action) -> Result<(), BrowserError> {
        if let Some(message) = &self.control_at(handle)?.fail_with {
            return Err(BrowserError::Command(message.clone()));
        }
        self.state().actions.push(action);
        Ok(())
    }
}

#[async_trait]
impl Page for FakePage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        if let Some(message) = &self.fail_navigation {
            return Err(BrowserError::Navigation(message.clone()));
        }
        let mut state = self.state();
        state.actions.push(Action::Goto(url.to_string()));
        state.url = self.url.clone();
        Ok(())
    }

    async fn url(&self) -> Result<String, BrowserError> {
        Ok(self.state().url.clone())
    }

    async fn html(&self) -> Result<String, BrowserError> {
        Ok(self.html.clone())
    }

    async fn count(&self, css: &str) -> Result<usize, BrowserError> {
        let locator = Locator::Css(css.to_string());
        let controls = self.controls.iter().filter(|c| c.matches(&locator)).count();
        let markers = self.markers.iter().filter(|m| *m == css).count();
        Ok(controls + markers)
    }

    async fn query(&self, locator: &Locator) -> Result<Vec<Control>, BrowserError> {
        if self.broken_locators.contains(locator) {
            return Err(BrowserError::Command(format!("{locator} lookup failed")));
        }
        Ok(self
            .controls
            .iter()
            .enumerate()
            .filter(|(_, c)| c.interactive && c.matches(locator))
            .map(|(i, c)| Control {
                handle: ControlHandle(i),
                kind: c.kind,
            })
            .collect())
    }

    async fn fill(&self, control: ControlHandle, value: &str) -> Result<(), BrowserError> {
        self.record(
            control,
            Action::Fill {
                control: control.0,
                value: value.to_string(),
            },
        )
    }

    async fn select(&self, control: ControlHandle, value: &str) -> Result<(), BrowserError> {
        self.record(
            control,
            Action::Select {
                control: control.0,
                value: value.to_string(),
            },
        )
    }

    async fn upload(&self, control: ControlHandle, path: &Path) -> Result<(), BrowserError> {
        self.record(
            control,
            Action::Upload {
                control: control.0,
                path: path.to_string_lossy().into_owned(),
            },
        )
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        if self.fail_screenshots {
            return Err(BrowserError::Command("screenshot unavailable".to_string()));
        }
        self.state().actions.push(Action::Screenshot);
        Ok(b"\x89PNG\r\n\x1a\n".to_vec())
    }
}
