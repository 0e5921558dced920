//! Tests insertion ordering and id monotonicity of the conversation log.

use insight_chat_core::{ConversationLog, Message, MessageIdGenerator, Role};

#[test]
fn message_ordering_tests_preserve_insertion_order() {
    let mut ids = MessageIdGenerator::new();
    let mut log = ConversationLog::new();

    log.append(Message::text(ids.next_id(), Role::User, "first", 10));
    log.append(Message::text(ids.next_id(), Role::System, "second", 5));
    log.append(Message::error(ids.next_id(), "third", 20));

    let contents: Vec<&str> = log
        .messages()
        .iter()
        .map(|message| message.content.as_str())
        .collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
    assert!(log.last().expect("log should have a tail").is_error);
}

#[test]
fn message_ordering_tests_ids_keep_increasing_after_clear() {
    let mut ids = MessageIdGenerator::new();
    let mut log = ConversationLog::new();

    log.append(Message::text(ids.next_id(), Role::User, "a", 0));
    let before_clear = log.last().expect("one message").id;
    log.clear();
    assert!(log.is_empty());

    log.append(Message::text(ids.next_id(), Role::User, "b", 0));
    assert!(log.last().expect("one message").id > before_clear);
}
