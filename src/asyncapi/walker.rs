//! Lazy iteration over (channel, message) pairs.

use std::borrow::Cow;

use serde_yaml::{mapping, Mapping, Value};

use super::error::DeriveError;
use super::scalar_key;

/// One message entry of one channel.
///
/// Names are borrowed from the document when the YAML key is a string, and
/// owned when a number or bool key had to be converted.
#[derive(Debug, Clone, PartialEq)]
pub struct MessageSlot<'a> {
    pub channel_name: Cow<'a, str>,
    pub channel: &'a Mapping,
    pub message_key: Cow<'a, str>,
    /// Inline message definition or `{ $ref: ... }` object, as written
    pub message: &'a Value,
}

/// Iterator over every channel's `messages` entries, in document order.
///
/// Channels without messages contribute nothing. The first structural
/// problem is yielded as an error and ends the iteration.
pub struct ChannelMessages<'a> {
    channels: mapping::Iter<'a>,
    current: Option<(Cow<'a, str>, &'a Mapping, mapping::Iter<'a>)>,
    done: bool,
}

impl<'a> ChannelMessages<'a> {
    pub fn new(channels: &'a Mapping) -> Self {
        Self {
            channels: channels.iter(),
            current: None,
            done: false,
        }
    }

    fn fail(&mut self, path: String, expected: &'static str) -> Option<Result<MessageSlot<'a>, DeriveError>> {
        self.done = true;
        Some(Err(DeriveError::Malformed { path, expected }))
    }
}

impl<'a> Iterator for ChannelMessages<'a> {
    type Item = Result<MessageSlot<'a>, DeriveError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }

            if let Some((channel_name, channel, messages)) = &mut self.current {
                if let Some((key, message)) = messages.next() {
                    let slot = scalar_key(key).map(|message_key| MessageSlot {
                        channel_name: channel_name.clone(),
                        channel: *channel,
                        message_key,
                        message,
                    });
                    return match slot {
                        Some(slot) => Some(Ok(slot)),
                        None => {
                            let path = format!("channels.{}.messages", channel_name);
                            self.fail(path, "scalar message keys")
                        }
                    };
                }
                self.current = None;
            }

            let (name, value) = self.channels.next()?;
            let Some(channel_name) = scalar_key(name) else {
                return self.fail("channels".to_string(), "scalar channel names");
            };

            let channel = match value {
                Value::Mapping(channel) => channel,
                Value::Null => continue,
                _ => return self.fail(format!("channels.{}", channel_name), "a mapping"),
            };

            match channel.get("messages") {
                None | Some(Value::Null) => continue,
                Some(Value::Mapping(messages)) => {
                    self.current = Some((channel_name, channel, messages.iter()));
                }
                Some(_) => {
                    return self.fail(format!("channels.{}.messages", channel_name), "a mapping");
                }
            }
        }
    }
}
