use super::{AtsAdapter, Signal};

/// Lever postings (`jobs.lever.co/<company>/<id>/apply`).
pub struct LeverAdapter;

const SIGNALS: &[Signal] = &[
    Signal::url("jobs.lever.co", 0.5),
    Signal::form(".application-page", 0.1),
    Signal::branding("lever-jobs-embed", 0.1),
    Signal::field("input[name=\"urls[LinkedIn]\"]", 0.3),
];

impl AtsAdapter for LeverAdapter {
    fn id(&self) -> &'static str {
        "lever"
    }

    fn signals(&self) -> &'static [Signal] {
        SIGNALS
    }

    fn field_selectors(&self, field: &str) -> &'static [&'static str] {
        match field {
            "name" => &["input[name=\"name\"]"],
            "email" => &["input[name=\"email\"]"],
            "phone" => &["input[name=\"phone\"]"],
            "linkedin" => &["input[name=\"urls[LinkedIn]\"]"],
            "github" => &["input[name=\"urls[GitHub]\"]"],
            "location_city" => &["input[name=\"location\"]"],
            _ => &[],
        }
    }

    fn resume_selectors(&self) -> &'static [&'static str] {
        &["input[name=\"resume\"]", "#resume-upload-input"]
    }
}
