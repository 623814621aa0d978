//! Topic derivation for a channel.

use serde_yaml::{Mapping, Value};

/// Topic a channel publishes to: the kafka binding topic, else the channel
/// `address`, else the channel name. Empty strings are skipped.
pub fn derive_topic(channel_name: &str, channel: &Mapping) -> String {
    let kafka_topic = channel
        .get("bindings")
        .and_then(|bindings| bindings.get("kafka"))
        .and_then(|kafka| kafka.get("topic"))
        .and_then(Value::as_str);
    let address = channel.get("address").and_then(Value::as_str);

    kafka_topic
        .into_iter()
        .chain(address)
        .find(|candidate| !candidate.is_empty())
        .unwrap_or(channel_name)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(source: &str) -> Mapping {
        serde_yaml::from_str(source).unwrap()
    }

    #[test]
    fn test_kafka_binding_wins() {
        let ch = channel("address: user/created\nbindings:\n  kafka:\n    topic: users\n");
        assert_eq!(derive_topic("userCreated", &ch), "users");
    }

    #[test]
    fn test_address_fallback() {
        let ch = channel("address: user/created\n");
        assert_eq!(derive_topic("userCreated", &ch), "user/created");
    }

    #[test]
    fn test_channel_name_fallback() {
        let ch = channel("description: no topic here\n");
        assert_eq!(derive_topic("userCreated", &ch), "userCreated");
    }

    #[test]
    fn test_null_address_and_empty_topic_are_skipped() {
        let ch = channel("address: null\nbindings:\n  kafka:\n    topic: ''\n");
        assert_eq!(derive_topic("userCreated", &ch), "userCreated");
    }
}
