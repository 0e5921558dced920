//! Deterministic fixtures for benchmark smoke tests.

use insight_chat_core::{ImageAttachment, Message, MessageIdGenerator, Role};
use insight_chat_ui::UiState;

/// Builds a UI state holding `exchanges` user/system message pairs, every
/// tenth user message carrying an image preview of `image_bytes` bytes.
pub fn populated_state(exchanges: usize, image_bytes: usize) -> UiState {
    let mut ids = MessageIdGenerator::new();
    let mut state = UiState::new("bench");
    let pixels = vec![7_u8; image_bytes.max(1)];

    for index in 0..exchanges {
        let timestamp_ms = index as u64 * 1_000;
        let mut user = Message::text(
            ids.next_id(),
            Role::User,
            format!("request {index}"),
            timestamp_ms,
        );
        if index % 10 == 0 {
            let image = ImageAttachment::from_bytes(format!("frame-{index}.png"), &pixels)
                .expect("png fixture should encode");
            user = user.with_image(image);
        }
        state.log.append(user);
        state.log.append(
            Message::text(
                ids.next_id(),
                Role::System,
                format!("analysis result {index}"),
                timestamp_ms + 500,
            )
            .with_source(Some("bench".to_string())),
        );
    }
    state
}
