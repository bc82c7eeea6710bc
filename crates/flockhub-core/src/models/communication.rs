use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum Channel {
    Email,
    Sms,
    Push,
}

impl Channel {
    pub fn label(&self) -> &'static str {
        match self {
            Channel::Email => "Email",
            Channel::Sms => "Text message",
            Channel::Push => "Push notification",
        }
    }
}

/// An announcement sent to a church, team or ministry audience.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Communication {
    pub id: String,
    #[serde(rename = "churchId")]
    pub church_id: String,
    pub subject: String,
    pub body: String,
    pub channel: Channel,
    #[serde(rename = "sentAt", default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(type = "string | null"))]
    pub sent_at: Option<DateTime<Utc>>,
}
