use std::fmt;

use serde::Serialize;

/// Outcome of classifying one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// Already present in the blacklist; nothing was fetched.
    Blacklisted,
    /// Matched a content heuristic and was added to the blacklist.
    Phishing(HeuristicMatch),
    Unclassified,
    /// The page could not be retrieved. Callers treat it like `Unclassified`.
    FetchFailed { reason: String },
}

impl Verdict {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Self::Blacklisted | Self::Phishing(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Blacklisted => "blacklisted",
            Self::Phishing(_) => "phishing",
            Self::Unclassified => "unclassified",
            Self::FetchFailed { .. } => "fetch_failed",
        }
    }
}

/// The heuristic rule that flagged a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum HeuristicMatch {
    BrandTitle { brand: String },
    CredentialForm { form_index: usize },
}

impl fmt::Display for HeuristicMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BrandTitle { brand } => {
                write!(f, "page title impersonates {brand}")
            }
            Self::CredentialForm { form_index } => {
                write!(f, "form #{form_index} asks for a username and password")
            }
        }
    }
}
