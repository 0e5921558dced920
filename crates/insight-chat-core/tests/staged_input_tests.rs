//! Tests staged input trimming, clearing and URL validation.

use insight_chat_core::{
    DocumentAttachment, InputKind, StagedInput, validate_document_url,
};

#[test]
fn staged_input_tests_whitespace_text_is_not_submittable() {
    let mut staged = StagedInput {
        text: "   \n\t ".to_string(),
        ..StagedInput::default()
    };
    assert_eq!(staged.trimmed_text(), None);

    staged.text = "  summarize me  ".to_string();
    assert_eq!(staged.trimmed_text(), Some("summarize me"));
}

#[test]
fn staged_input_tests_clear_text_keeps_document() {
    let mut staged = StagedInput {
        document: Some(
            DocumentAttachment::from_bytes("report.pdf", vec![1, 2, 3])
                .expect("pdf should be accepted"),
        ),
        text: "https://example.com/doc".to_string(),
        kind: InputKind::Url,
        ..StagedInput::default()
    };

    staged.clear_text();
    assert!(staged.text.is_empty());
    assert!(staged.document.is_some());

    staged.clear();
    assert!(staged.is_empty());
    assert_eq!(staged.kind, InputKind::Text);
}

#[test]
fn staged_input_tests_url_validation_accepts_http_only() {
    assert!(validate_document_url("https://example.com/doc").is_ok());
    assert!(validate_document_url(" http://example.com ").is_ok());
    assert!(validate_document_url("ftp://example.com/doc").is_err());
    assert!(validate_document_url("example.com/doc").is_err());
    assert_eq!(InputKind::parse("URL"), Some(InputKind::Url));
    assert_eq!(InputKind::parse("pdf"), None);
}
