use tracing::{debug, warn};

use crate::adapters::AtsAdapter;
use crate::browser::{Control, Locator, Page};

/// Lookup strategies in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    AtsSelector,
    NameAttribute,
    LabelText,
    Placeholder,
    AccessibleName,
}

impl Strategy {
    pub const CHAIN: [Strategy; 5] = [
        Strategy::AtsSelector,
        Strategy::NameAttribute,
        Strategy::LabelText,
        Strategy::Placeholder,
        Strategy::AccessibleName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::AtsSelector => "ats_selector",
            Strategy::NameAttribute => "name_attribute",
            Strategy::LabelText => "label_text",
            Strategy::Placeholder => "placeholder",
            Strategy::AccessibleName => "accessible_name",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub control: Control,
    pub locator: Locator,
    pub strategy: Strategy,
}

/// Human wording a form might use for a canonical field.
fn phrases(field: &str) -> Vec<String> {
    let known: &[&str] = match field {
        "name" => &["full name", "name"],
        "first_name" => &["first name", "given name", "forename"],
        "last_name" => &["last name", "surname", "family name"],
        "email" => &["email", "e-mail"],
        "phone" => &["phone", "mobile", "telephone"],
        "linkedin" => &["linkedin"],
        "github" => &["github"],
        "location_city" => &["city", "location"],
        "location_country" => &["country"],
        _ => &[],
    };
    if known.is_empty() {
        vec![field.replace('_', " ")]
    } else {
        known.iter().map(|p| p.to_string()).collect()
    }
}

/// `name` attribute spellings: `first_name`, `firstname`, `first-name`.
fn name_attributes(field: &str) -> Vec<String> {
    let mut names = vec![
        field.to_string(),
        field.replace('_', ""),
        field.replace('_', "-"),
    ];
    names.dedup();
    names
}

pub fn candidates(adapter: &dyn AtsAdapter, field: &str, strategy: Strategy) -> Vec<Locator> {
    match strategy {
        Strategy::AtsSelector => adapter
            .field_selectors(field)
            .iter()
            .map(|s| Locator::Css(s.to_string()))
            .collect(),
        Strategy::NameAttribute => name_attributes(field)
            .into_iter()
            .map(Locator::NameAttr)
            .collect(),
        Strategy::LabelText => phrases(field).into_iter().map(Locator::LabelText).collect(),
        Strategy::Placeholder => phrases(field)
            .into_iter()
            .map(Locator::Placeholder)
            .collect(),
        Strategy::AccessibleName => phrases(field)
            .into_iter()
            .map(Locator::AccessibleName)
            .collect(),
    }
}

/// Walks the strategy chain and returns the first locator that finds exactly
/// one interactive control. Lookup errors only skip that locator.
pub async fn resolve_field(
    page: &dyn Page,
    adapter: &dyn AtsAdapter,
    field: &str,
) -> Option<ResolvedField> {
    for strategy in Strategy::CHAIN {
        for locator in candidates(adapter, field, strategy) {
            let controls = match page.query(&locator).await {
                Ok(controls) => controls,
                Err(e) => {
                    warn!("Lookup {locator} for field {field} failed: {e}");
                    continue;
                }
            };
            match controls.as_slice() {
                [control] => {
                    debug!("Field {field} resolved by {locator}");
                    return Some(ResolvedField {
                        control: *control,
                        locator,
                        strategy,
                    });
                }
                [] => {}
                many => debug!("{locator} is ambiguous for {field} ({} matches)", many.len()),
            }
        }
    }
    None
}
