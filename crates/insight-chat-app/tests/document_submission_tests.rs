//! Integration tests for the document input adapter.

mod common;

use insight_chat_app::ControllerError;
use insight_chat_core::{CoreError, InputKind, Role};
use insight_chat_transport::AnalysisRequest;

#[test]
fn document_submission_tests_url_scenario() {
    let (mut controller, _, analysis) = common::controller_on("document-analysis");
    analysis.push(common::ok(
        r#"{"success":true,"summary":"A short summary.","source_type":"URL"}"#,
    ));

    controller
        .submit_text(InputKind::Url, "https://example.com/doc")
        .expect("url submission should be accepted");

    let log = &controller.state().log;
    assert_eq!(log.len(), 2);
    assert_eq!(log.messages()[0].role, Role::User);
    assert!(log.messages()[0].content.contains("https://example.com/doc"));
    assert_eq!(log.messages()[1].role, Role::System);
    assert_eq!(log.messages()[1].content, "A short summary.");
    assert_eq!(log.messages()[1].source.as_deref(), Some("URL"));
    assert!(controller.state().staged.text.is_empty());
    assert!(!controller.state().busy);
    assert_eq!(
        analysis.last_request(),
        Some(AnalysisRequest::DocumentUrl(
            "https://example.com/doc".to_string()
        ))
    );
}

#[test]
fn document_submission_tests_url_message_quotes_the_url_that_is_sent() {
    let (mut controller, _, analysis) = common::controller_on("document-analysis");
    analysis.push(common::ok(r#"{"success":true,"summary":"ok"}"#));

    controller
        .submit_text(InputKind::Url, "  HTTPS://Example.COM  ")
        .expect("url submission should be accepted");

    assert_eq!(
        analysis.last_request(),
        Some(AnalysisRequest::DocumentUrl("https://example.com/".to_string()))
    );
    assert_eq!(
        controller.state().log.messages()[0].content,
        "Summarize document at https://example.com/"
    );
}

#[test]
fn document_submission_tests_whitespace_is_a_no_op() {
    let (mut controller, _, analysis) = common::controller_on("document-analysis");

    for value in ["", "   ", "\n\t  "] {
        controller
            .submit_text(InputKind::Text, value)
            .expect("blank input should be ignored");
    }
    assert!(!controller.state().can_submit_text());
    assert!(controller.state().log.is_empty());
    assert!(!controller.state().busy);
    assert_eq!(analysis.request_count(), 0);
}

#[test]
fn document_submission_tests_text_is_trimmed_and_sent_as_text() {
    let (mut controller, _, analysis) = common::controller_on("document-analysis");
    analysis.push(common::ok(r#"{"success":true,"summary":"ok"}"#));

    controller
        .submit_text(InputKind::Text, "  quarterly report body \n")
        .expect("text should be accepted");

    assert_eq!(
        controller.state().log.messages()[0].content,
        "quarterly report body"
    );
    assert_eq!(
        analysis.last_request(),
        Some(AnalysisRequest::DocumentText(
            "quarterly report body".to_string()
        ))
    );
}

#[test]
fn document_submission_tests_invalid_url_is_rejected_locally() {
    let (mut controller, _, analysis) = common::controller_on("document-analysis");

    let error = controller
        .submit_text(InputKind::Url, "not a url")
        .expect_err("invalid url should fail");
    assert!(matches!(error, ControllerError::Input(CoreError::InvalidUrl(_))));
    assert!(controller.state().log.is_empty());
    assert_eq!(analysis.request_count(), 0);
}

#[test]
fn document_submission_tests_file_upload_keeps_staged_file_after_text_submit() {
    let (mut controller, _, analysis) = common::controller_on("document-analysis");
    analysis.push(common::ok(
        r#"{"success":true,"summary":"pdf summary","source_type":"PDF"}"#,
    ));
    analysis.push(common::ok(r#"{"success":true,"summary":"text summary"}"#));

    let pending = controller
        .begin_document_upload("report.pdf", b"%PDF-1.4".to_vec())
        .expect("pdf should be accepted");
    assert_eq!(controller.state().log.len(), 1);
    assert!(controller.state().log.messages()[0].content.contains("report.pdf"));
    controller.dispatch(pending);

    controller
        .submit_text(InputKind::Text, "follow-up text")
        .expect("text should be accepted");

    let state = controller.state();
    assert_eq!(state.log.len(), 4);
    assert!(state.staged.text.is_empty());
    assert_eq!(
        state.staged.document.as_ref().map(|doc| doc.file_name.as_str()),
        Some("report.pdf")
    );
    assert!(matches!(
        analysis.requests.lock().expect("request lock should work")[0],
        AnalysisRequest::DocumentFile(_)
    ));
}

#[test]
fn document_submission_tests_file_mode_blocks_text_submit() {
    let (mut controller, _, analysis) = common::controller_on("document-analysis");

    let error = controller
        .submit_text(InputKind::File, "some text")
        .expect_err("file mode has no text submit");
    assert!(matches!(error, ControllerError::TextModeRequired));

    let unsupported = controller
        .begin_document_upload("notes.txt", b"plain".to_vec())
        .expect_err("txt is not a supported document");
    assert!(matches!(
        unsupported,
        ControllerError::Input(CoreError::UnsupportedDocumentType(_))
    ));
    assert!(controller.state().log.is_empty());
    assert_eq!(analysis.request_count(), 0);
}
