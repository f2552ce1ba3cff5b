use std::path::Path;

use async_trait::async_trait;
use fantoccini::elements::Element;
use fantoccini::{Client, ClientBuilder, Locator as By};
use serde_json::{json, Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{
    has_key_codes, strip_key_codes, BrowserError, Control, ControlHandle, ControlKind, Locator,
    Page,
};

const UPPER: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LOWER: &str = "abcdefghijklmnopqrstuvwxyz";
const CONTROL_AXIS: &str = "*[self::input or self::textarea or self::select]";

fn command_error(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Command(e.to_string())
}

/// Escapes a value for a double-quoted CSS attribute selector.
fn css_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Renders a string as an XPath literal, using `concat()` when it holds both quote kinds.
fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value.split('\'').map(|p| format!("'{p}'")).collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

fn label_xpath(text: &str) -> String {
    let needle = xpath_literal(&text.trim().to_lowercase());
    let label = format!(
        "//label[starts-with(translate(normalize-space(.), '{UPPER}', '{LOWER}'), {needle})]"
    );
    format!("//{CONTROL_AXIS}[@id = {label}/@for] | {label}//{CONTROL_AXIS}")
}

enum Query {
    Css(String),
    XPath(String),
}

fn translate(locator: &Locator) -> Query {
    match locator {
        Locator::Css(css) => Query::Css(css.clone()),
        Locator::NameAttr(name) => Query::Css(format!(
            "input[name=\"{0}\" i], textarea[name=\"{0}\" i], select[name=\"{0}\" i]",
            css_string(name)
        )),
        Locator::LabelText(text) => Query::XPath(label_xpath(text)),
        Locator::Placeholder(text) => Query::Css(format!(
            "input[placeholder*=\"{0}\" i], textarea[placeholder*=\"{0}\" i]",
            css_string(text)
        )),
        Locator::AccessibleName(text) => Query::Css(format!(
            "input[aria-label*=\"{0}\" i], textarea[aria-label*=\"{0}\" i], select[aria-label*=\"{0}\" i]",
            css_string(text)
        )),
    }
}

fn capabilities(headless: bool) -> Map<String, Value> {
    let mut chrome_args = vec!["--window-size=1280,1600"];
    let mut firefox_args = vec![];
    if headless {
        chrome_args.push("--headless=new");
        firefox_args.push("-headless");
    }
    let mut caps = Map::new();
    caps.insert("goog:chromeOptions".to_string(), json!({ "args": chrome_args }));
    caps.insert("moz:firefoxOptions".to_string(), json!({ "args": firefox_args }));
    caps
}

/// `Page` backed by a WebDriver session (chromedriver, geckodriver, ...).
///
/// Located elements are kept in an arena; a `ControlHandle` is an index into it.
pub struct WebDriverPage {
    client: Client,
    elements: Mutex<Vec<Element>>,
}

impl WebDriverPage {
    pub async fn launch(webdriver_url: &str, headless: bool) -> Result<Self, BrowserError> {
        let mut builder = ClientBuilder::native();
        builder.capabilities(capabilities(headless));
        let client = builder
            .connect(webdriver_url)
            .await
            .map_err(|e| BrowserError::Launch(e.to_string()))?;
        info!("Browser session started via {webdriver_url} (headless: {headless})");
        Ok(Self {
            client,
            elements: Mutex::new(Vec::new()),
        })
    }

    pub async fn close(self) -> Result<(), BrowserError> {
        self.client.close().await.map_err(command_error)
    }

    /// Keeps the browser window open after the agent exits so the user can
    /// review and submit the form.
    pub async fn leave_open(self) -> Result<(), BrowserError> {
        self.client.persist().await.map_err(command_error)
    }

    async fn element(&self, handle: ControlHandle) -> Result<Element, BrowserError> {
        self.elements
            .lock()
            .await
            .get(handle.0)
            .cloned()
            .ok_or(BrowserError::StaleHandle(handle.0))
    }

    async fn interactive_kind(element: &Element) -> Result<Option<ControlKind>, BrowserError> {
        let tag = element.tag_name().await.map_err(command_error)?;
        let input_type = element.attr("type").await.map_err(command_error)?;
        let Some(kind) = ControlKind::classify(&tag, input_type.as_deref()) else {
            return Ok(None);
        };
        if element.attr("disabled").await.map_err(command_error)?.is_some() {
            return Ok(None);
        }
        // File inputs are routinely styled away behind a custom button.
        if kind != ControlKind::File && !element.is_displayed().await.map_err(command_error)? {
            return Ok(None);
        }
        Ok(Some(kind))
    }
}

#[async_trait]
impl Page for WebDriverPage {
    async fn goto(&self, url: &str) -> Result<(), BrowserError> {
        self.client
            .goto(url)
            .await
            .map_err(|e| BrowserError::Navigation(e.to_string()))
    }

    async fn url(&self) -> Result<String, BrowserError> {
        let url = self.client.current_url().await.map_err(command_error)?;
        Ok(url.to_string())
    }

    async fn html(&self) -> Result<String, BrowserError> {
        self.client.source().await.map_err(command_error)
    }

    async fn count(&self, css: &str) -> Result<usize, BrowserError> {
        let found = self
            .client
            .find_all(By::Css(css))
            .await
            .map_err(command_error)?;
        Ok(found.len())
    }

    async fn query(&self, locator: &Locator) -> Result<Vec<Control>, BrowserError> {
        let found = match translate(locator) {
            Query::Css(css) => self.client.find_all(By::Css(&css)).await,
            Query::XPath(xpath) => self.client.find_all(By::XPath(&xpath)).await,
        }
        .map_err(command_error)?;

        let mut controls = Vec::new();
        for element in found {
            let Some(kind) = Self::interactive_kind(&element).await? else {
                continue;
            };
            let mut arena = self.elements.lock().await;
            arena.push(element);
            controls.push(Control {
                handle: ControlHandle(arena.len() - 1),
                kind,
            });
        }
        debug!("{locator} matched {} interactive controls", controls.len());
        Ok(controls)
    }

    async fn fill(&self, control: ControlHandle, value: &str) -> Result<(), BrowserError> {
        let element = self.element(control).await?;
        element.clear().await.map_err(command_error)?;
        element
            .send_keys(&strip_key_codes(value))
            .await
            .map_err(command_error)
    }

    async fn select(&self, control: ControlHandle, value: &str) -> Result<(), BrowserError> {
        let element = self.element(control).await?;
        if element.select_by_label(value).await.is_ok() {
            return Ok(());
        }
        element.select_by_value(value).await.map_err(command_error)
    }

    async fn upload(&self, control: ControlHandle, path: &Path) -> Result<(), BrowserError> {
        let path = path.to_string_lossy();
        if has_key_codes(&path) {
            return Err(BrowserError::Command(format!(
                "refusing to type {path:?}: contains WebDriver key codes"
            )));
        }
        let element = self.element(control).await?;
        element
            .send_keys(&path)
            .await
            .map_err(command_error)
    }

    async fn screenshot(&self) -> Result<Vec<u8>, BrowserError> {
        self.client.screenshot().await.map_err(command_error)
    }
}
