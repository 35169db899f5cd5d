use serde::{Deserialize, Serialize};
use std::fmt;

/// Conditions that degrade a plan without stopping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// The requested range was longer than the forecast provider serves.
    RangeClamped,
    /// The forecast provider failed; the schedule is empty.
    UpstreamFetch,
    /// The place name for the coordinates could not be resolved.
    GeocodeLookup,
    /// A crop or soil name was not registered and a default was substituted.
    ProfileFallback,
}

/// A user-visible message attached to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
