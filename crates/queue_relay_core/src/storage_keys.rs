pub const MESSAGE_OBJECT_EXTENSION: &str = "json";

/// Object key a relayed message is stored under. Same id, same key.
pub fn message_object_key(message_id: &str) -> String {
    format!("{message_id}.{MESSAGE_OBJECT_EXTENSION}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_message_key_from_id() {
        assert_eq!(message_object_key("m1"), "m1.json");
    }

    #[test]
    fn keeps_transport_ids_verbatim() {
        let key = message_object_key("059f36b4-87a3-44ab-83d2-661975830a7d");
        assert_eq!(key, "059f36b4-87a3-44ab-83d2-661975830a7d.json");
    }
}
