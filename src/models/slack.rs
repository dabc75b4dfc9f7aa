use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackPayload {
    /// Plain-text fallback shown in notifications and by clients without blocks.
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_emoji: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,

    pub blocks: Vec<SlackBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackBlock {
    Header {
        text: SlackText,
    },
    Section {
        #[serde(skip_serializing_if = "Option::is_none")]
        text: Option<SlackText>,

        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        fields: Vec<SlackText>,
    },
    Context {
        elements: Vec<SlackText>,
    },
    Divider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SlackText {
    #[serde(rename = "plain_text")]
    Plain { text: String, emoji: bool },

    #[serde(rename = "mrkdwn")]
    Markdown { text: String },
}

impl SlackText {
    pub fn plain(text: impl Into<String>) -> Self {
        SlackText::Plain {
            text: text.into(),
            emoji: true,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        SlackText::Markdown { text: text.into() }
    }
}
