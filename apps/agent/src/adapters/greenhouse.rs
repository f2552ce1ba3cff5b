use super::{AtsAdapter, Signal};

/// Greenhouse hosted boards (`boards.greenhouse.io`) and embedded `grnhse` iframes.
pub struct GreenhouseAdapter;

const SIGNALS: &[Signal] = &[
    Signal::url("greenhouse.io", 0.5),
    Signal::form("#application_form", 0.1),
    Signal::branding("grnhse", 0.1),
    Signal::field("#first_name", 0.3),
];

impl AtsAdapter for GreenhouseAdapter {
    fn id(&self) -> &'static str {
        "greenhouse"
    }

    fn signals(&self) -> &'static [Signal] {
        SIGNALS
    }

    fn field_selectors(&self, field: &str) -> &'static [&'static str] {
        match field {
            "first_name" => &["#first_name"],
            "last_name" => &["#last_name"],
            "email" => &["#email"],
            "phone" => &["#phone"],
            "linkedin" => &[
                "input[autocomplete=\"custom-question-linkedin-profile\"]",
                "input[aria-label*=\"LinkedIn\"]",
            ],
            "github" => &["input[aria-label*=\"GitHub\"]"],
            "location_city" => &["#candidate-location", "#job_application_location"],
            _ => &[],
        }
    }

    fn resume_selectors(&self) -> &'static [&'static str] {
        &[
            "#resume",
            "#s3_upload_for_resume input[type=\"file\"]",
            "input[type=\"file\"][id*=\"resume\"]",
        ]
    }

    fn splits_name(&self) -> bool {
        true
    }
}
