use serde::Serialize;
use sha1::{Digest, Sha1};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::explorer::selector::Candidate;

/// One line of the JSONL attempt trace.
#[derive(Debug, Clone, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u128,

    pub app: String,
    pub screen: String,

    pub gesture: Option<String>,
    pub path: Option<String>,

    pub changed: Option<bool>,
    pub error: Option<String>,

    pub before_sha1: Option<String>,
    pub after_sha1: Option<String>,
}

impl TraceEvent {
    pub fn now(app: &str, screen: &str) -> Self {
        Self {
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis())
                .unwrap_or(0),
            app: app.to_string(),
            screen: screen.to_string(),
            gesture: None,
            path: None,
            changed: None,
            error: None,
            before_sha1: None,
            after_sha1: None,
        }
    }

    pub fn with_candidate(mut self, candidate: &Candidate) -> Self {
        self.gesture = Some(candidate.kind.to_string());
        self.path = Some(candidate.path.clone());
        self
    }

    pub fn with_changed(mut self, changed: bool) -> Self {
        self.changed = Some(changed);
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_fingerprints(mut self, before: Option<String>, after: Option<String>) -> Self {
        self.before_sha1 = before;
        self.after_sha1 = after;
        self
    }
}

/// Hex SHA-1 of a serialized hierarchy.
pub fn fingerprint(text: &str) -> String {
    let digest = Sha1::digest(text.as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}
