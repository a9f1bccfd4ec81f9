//! Which chat messages the bot answers, and with what image.

use serde::{Deserialize, Serialize};

pub const COMMAND_PREFIX: &str = "!price";
/// Channel where every posted screenshot is priced without a command.
pub const AUTO_CHANNEL: &str = "card-pulls";
pub const UPLOAD_PROMPT: &str =
    "Please upload a card screenshot, or reply to a message that contains one! 📸";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub content_type: Option<String>,
}

impl Attachment {
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|content_type| content_type.starts_with("image/"))
    }
}

/// The parts of a chat message the trigger rules look at.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub author_is_bot: bool,
    pub content: String,
    pub channel_name: String,
    pub attachments: Vec<Attachment>,
    /// Attachments of the message this one replies to, if any.
    #[serde(default)]
    pub referenced_attachments: Vec<Attachment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Ignore,
    /// Reply with [`UPLOAD_PROMPT`].
    PromptForImage,
    Identify { image_url: String },
}

pub fn classify(message: &IncomingMessage) -> Trigger {
    if message.author_is_bot {
        return Trigger::Ignore;
    }

    let is_command = message
        .content
        .get(..COMMAND_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(COMMAND_PREFIX));
    let is_auto = message.channel_name == AUTO_CHANNEL;
    if !is_command && !is_auto {
        return Trigger::Ignore;
    }

    let image = message
        .attachments
        .iter()
        .find(|attachment| attachment.is_image())
        .or_else(|| {
            message
                .referenced_attachments
                .iter()
                .find(|attachment| attachment.is_image())
        });

    match image {
        Some(attachment) => Trigger::Identify {
            image_url: attachment.url.clone(),
        },
        None if is_command => Trigger::PromptForImage,
        None => Trigger::Ignore,
    }
}
