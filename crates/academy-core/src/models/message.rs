use std::fmt;

use serde::{Deserialize, Serialize};

use crate::selection::AudienceSelection;

/// Delivery channel of an outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Announcement,
    Sms,
}

impl Channel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "announcement" | "announcements" => Some(Channel::Announcement),
            "sms" => Some(Channel::Sms),
            _ => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Announcement => write!(f, "announcement"),
            Channel::Sms => write!(f, "sms"),
        }
    }
}

/// Create request body for an announcement or SMS. Recipients are not sent;
/// the backend resolves `target_audience` itself at dispatch time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub title: String,
    pub body: String,
    pub channel: Channel,
    pub target_audience: AudienceSelection,
}

impl OutboundMessage {
    pub fn new(
        channel: Channel,
        title: impl Into<String>,
        body: impl Into<String>,
        audience: AudienceSelection,
    ) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            channel,
            target_audience: audience,
        }
    }
}
