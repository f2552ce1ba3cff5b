use super::{AtsAdapter, Signal};

/// Workday tenants (`<tenant>.myworkdayjobs.com`). Every control carries a
/// `data-automation-id`, which is what the selectors key on.
pub struct WorkdayAdapter;

const SIGNALS: &[Signal] = &[
    Signal::url("myworkdayjobs.com", 0.5),
    Signal::form("[data-automation-id=\"applyFlowPage\"]", 0.1),
    Signal::branding("workday", 0.1),
    Signal::field("[data-automation-id=\"legalNameSection_firstName\"]", 0.3),
];

impl AtsAdapter for WorkdayAdapter {
    fn id(&self) -> &'static str {
        "workday"
    }

    fn signals(&self) -> &'static [Signal] {
        SIGNALS
    }

    fn field_selectors(&self, field: &str) -> &'static [&'static str] {
        match field {
            "first_name" => &["input[data-automation-id=\"legalNameSection_firstName\"]"],
            "last_name" => &["input[data-automation-id=\"legalNameSection_lastName\"]"],
            "email" => &["input[data-automation-id=\"email\"]"],
            "phone" => &["input[data-automation-id=\"phone-number\"]"],
            "location_city" => &["input[data-automation-id=\"addressSection_city\"]"],
            "location_country" => &["[data-automation-id=\"countryDropdown\"]"],
            _ => &[],
        }
    }

    fn resume_selectors(&self) -> &'static [&'static str] {
        &["input[data-automation-id=\"file-upload-input-ref\"]"]
    }

    fn splits_name(&self) -> bool {
        true
    }
}
