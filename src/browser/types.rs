//! Browser session types.

use serde::{Deserialize, Serialize};

/// Cookie extracted from browser session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserCookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub secure: bool,
    #[serde(default)]
    pub http_only: bool,
}

fn default_path() -> String {
    "/".to_string()
}

/// Result of a top-level page load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLoad {
    /// URL the surface ended up on after redirects.
    pub final_url: String,
}

/// Ways the consent gate's affirmative control can be located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AffirmativeControl {
    /// Any visible element whose trimmed text equals the label.
    ExactText,
    /// Element with `role="button"` whose accessible name is the label.
    RoleButton,
    /// `<button>` whose text contains the label.
    ButtonWithText,
    /// `<a>` whose text contains the label.
    AnchorWithText,
    /// `<input type="submit">` whose value is the label.
    SubmitInput,
}

impl AffirmativeControl {
    /// Candidates in the order they are tried.
    pub const PRIORITY: [AffirmativeControl; 5] = [
        AffirmativeControl::ExactText,
        AffirmativeControl::RoleButton,
        AffirmativeControl::ButtonWithText,
        AffirmativeControl::AnchorWithText,
        AffirmativeControl::SubmitInput,
    ];

    pub fn describe(self) -> &'static str {
        match self {
            AffirmativeControl::ExactText => "exact text",
            AffirmativeControl::RoleButton => "role=button",
            AffirmativeControl::ButtonWithText => "button",
            AffirmativeControl::AnchorWithText => "link",
            AffirmativeControl::SubmitInput => "submit input",
        }
    }
}
