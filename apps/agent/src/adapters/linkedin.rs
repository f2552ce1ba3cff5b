use super::{AtsAdapter, Signal};

/// LinkedIn Easy Apply, which renders the form in a modal over the job page.
pub struct LinkedInAdapter;

const SIGNALS: &[Signal] = &[
    Signal::url("linkedin.com/jobs", 0.5),
    Signal::form(".jobs-easy-apply-modal", 0.1),
    Signal::branding("easy apply", 0.1),
    Signal::field("input[id*=\"phoneNumber-nationalNumber\"]", 0.3),
];

impl AtsAdapter for LinkedInAdapter {
    fn id(&self) -> &'static str {
        "linkedin"
    }

    fn signals(&self) -> &'static [Signal] {
        SIGNALS
    }

    fn field_selectors(&self, field: &str) -> &'static [&'static str] {
        match field {
            "first_name" => &[".jobs-easy-apply-modal input[id*=\"firstName\"]"],
            "last_name" => &[".jobs-easy-apply-modal input[id*=\"lastName\"]"],
            "email" => &[".jobs-easy-apply-modal select[id*=\"emailAddress\"]"],
            "phone" => &["input[id*=\"phoneNumber-nationalNumber\"]"],
            "location_city" => &[".jobs-easy-apply-modal input[id*=\"city\"]"],
            _ => &[],
        }
    }

    fn resume_selectors(&self) -> &'static [&'static str] {
        &[
            "input[id*=\"jobs-document-upload-file-input-upload-resume\"]",
            ".jobs-easy-apply-modal input[type=\"file\"]",
        ]
    }

    fn splits_name(&self) -> bool {
        true
    }
}
