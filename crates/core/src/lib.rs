//! Verdict model and response classification for clamd replies.
//! No networking; pure string work over decoded daemon output.

pub mod config;
pub mod error;

pub use config::{Config, FileConfig};
pub use error::{ClamError, Result};

const RESPONSE_OK: &str = "stream: OK";
const RESPONSE_TOO_BIG: &str = "INSTREAM size limit exceeded. ERROR";
const FOUND_PREFIX: &str = "stream: ";
const FOUND_SUFFIX: &str = " FOUND";

/// Classification of a scan reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    /// No signature matched. The data is not necessarily clean, but the
    /// daemon found nothing.
    Ok,
    /// One or more signatures matched; carries the reported name.
    ///
    /// The name is extracted by stripping the literal `"stream: "` prefix
    /// and the final `" FOUND"` suffix, so a signature name that itself ends
    /// with `" FOUND"` would be truncated at that suffix.
    Found(String),
    /// The daemon rejected the stream under its size policy.
    SizeLimitExceeded,
    /// The reply did not match any recognized form. Not an error; the caller
    /// decides how to treat unexpected daemon output.
    Unknown,
}

impl Status {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Name of the matched signature, when [`Status::Found`].
    #[must_use]
    pub fn threat_name(&self) -> Option<&str> {
        match self {
            Self::Found(name) => Some(name),
            _ => None,
        }
    }
}

/// A classified scan reply: the decoded response text plus its [`Status`].
///
/// Derived deterministically from the raw reply bytes; classification is
/// total and never fails. Anything unrecognized degrades to
/// [`Status::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    response: String,
    status: Status,
}

impl ScanResult {
    /// Classify a raw reply still carrying its trailing terminator byte.
    #[must_use]
    pub fn from_raw(raw: &[u8]) -> Self {
        // Replies end with a single NUL; drop it before classification.
        let body = match raw.split_last() {
            Some((_, rest)) => rest,
            None => raw,
        };
        Self::from_text(&String::from_utf8_lossy(body))
    }

    /// Classify reply text that has already had its terminator stripped.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self {
            response: text.to_string(),
            status: classify(text),
        }
    }

    /// The decoded response text.
    #[must_use]
    pub fn response(&self) -> &str {
        &self.response
    }

    #[must_use]
    pub const fn status(&self) -> &Status {
        &self.status
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.status.is_ok()
    }

    #[must_use]
    pub const fn is_found(&self) -> bool {
        self.status.is_found()
    }

    /// Name of the matched signature, when one was found.
    #[must_use]
    pub fn threat_name(&self) -> Option<&str> {
        self.status.threat_name()
    }
}

/// First match wins; each arm is a whole-string test, not a substring search.
fn classify(text: &str) -> Status {
    if text == RESPONSE_OK {
        return Status::Ok;
    }
    if let Some(name) = text
        .strip_prefix(FOUND_PREFIX)
        .and_then(|rest| rest.strip_suffix(FOUND_SUFFIX))
    {
        if !name.is_empty() {
            return Status::Found(name.to_string());
        }
    }
    if text == RESPONSE_TOO_BIG {
        return Status::SizeLimitExceeded;
    }
    Status::Unknown
}
