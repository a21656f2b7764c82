//! Property-based tests for the broker envelope

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use justjio::shared::{ChatMessageData, Envelope, MessageType};

proptest! {
    #[test]
    fn test_chat_envelope_survives_the_wire(
        room_id in "[0-9a-f-]{36}",
        sender_id in 1i64..i64::MAX,
        sender_name in "[a-zA-Z][a-zA-Z0-9_]{2,29}",
        content in ".*",
        seconds in 0i64..4_102_444_800,
    ) {
        let sent_at = Utc.timestamp_opt(seconds, 0).unwrap();
        let data = ChatMessageData::new(room_id, sender_id, sender_name, content, sent_at);
        let bytes = Envelope::chat_message(&data).unwrap().to_bytes().unwrap();

        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        prop_assert_eq!(&json["msgType"], "CREATE_MESSAGE");
        prop_assert_eq!(&json["data"]["senderId"], &sender_id.to_string());

        let envelope = Envelope::from_slice(&bytes).unwrap();
        prop_assert_eq!(envelope.msg_type, MessageType::CreateMessage);
        prop_assert_eq!(envelope.chat_data().unwrap(), data);
    }

    #[test]
    fn test_sent_at_has_second_precision(seconds in 0i64..4_102_444_800, nanos in 0u32..1_000_000_000) {
        let sent_at = Utc.timestamp_opt(seconds, nanos).unwrap();
        let data = ChatMessageData::new("room", 1, "alice", "hi", sent_at);

        prop_assert!(data.sent_at.ends_with('Z'));
        prop_assert!(!data.sent_at.contains('.'));
        prop_assert_eq!(data.sent_at.len(), "2026-01-01T00:00:00Z".len());
    }

    #[test]
    fn test_notification_envelope_tag(title in ".*", content in ".*") {
        let envelope = Envelope::notification(title.clone(), content.clone()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&envelope.to_bytes().unwrap()).unwrap();

        prop_assert_eq!(&json["msgType"], "NOTIFICATION");
        prop_assert_eq!(&json["data"]["title"], &title);
        prop_assert_eq!(&json["data"]["content"], &content);
    }
}
