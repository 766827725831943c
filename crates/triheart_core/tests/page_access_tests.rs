//! Integration tests for page resolution and page annotations.

mod common;

use common::{json_body, StubTransport};
use serde_json::json;
use triheart_core::page_access::{NETWORK_ERROR_MESSAGE, TRIAL_LIMIT_MESSAGE};
use triheart_core::{
    BackendReply, PageAccessResolver, PageAnnotationAggregator, PageStatus, Payload, PortError,
    ReasonCode, Rect, RenderMode,
};

const WEBP: &str = "/page/webpUrl";

fn assert_invariants(page: &triheart_core::PageDescriptor) {
    match page.status {
        PageStatus::Allow => assert!(page.url.as_deref().is_some_and(|u| !u.is_empty())),
        PageStatus::Locked | PageStatus::Error => {
            assert!(page.message.as_deref().is_some_and(|m| !m.is_empty()))
        }
        PageStatus::Loading => panic!("resolver must never return a loading page"),
    }
    assert_eq!((page.width, page.height), (0, 0));
}

#[tokio::test]
async fn allowed_page_carries_backend_url() {
    let stub = StubTransport::new();
    stub.ok(WEBP, json!("https://cdn.example/b1/3.webp"));
    let resolver = PageAccessResolver::new(stub.clone());

    let page = resolver.resolve_page("b1", 3, RenderMode::Crop).await;

    assert_eq!(page.status, PageStatus::Allow);
    assert_eq!(page.url.as_deref(), Some("https://cdn.example/b1/3.webp"));
    assert_eq!(page.book_id, "b1");
    assert_eq!(page.page_no, 3);
    assert_invariants(&page);

    let calls = stub.calls_to(WEBP);
    assert_eq!(calls.len(), 1);
    assert_eq!(
        json_body(&calls[0]),
        &json!({"bookId": "b1", "pageNo": 3, "webpType": "crop"})
    );
}

#[tokio::test]
async fn origin_mode_is_forwarded() {
    let stub = StubTransport::new();
    stub.ok(WEBP, json!("https://cdn.example/b1/3-origin.webp"));
    let resolver = PageAccessResolver::new(stub.clone());

    resolver.resolve_page("b1", 3, RenderMode::Origin).await;

    assert_eq!(json_body(&stub.calls()[0])["webpType"], "origin");
}

#[tokio::test]
async fn business_denial_uses_backend_message() {
    let stub = StubTransport::new();
    stub.denied(WEBP, Some("超出试读范围，请购买后继续阅读"));
    let page = PageAccessResolver::new(stub).resolve_page("b1", 40, RenderMode::Crop).await;

    assert_eq!(page.status, PageStatus::Locked);
    assert_eq!(page.reason_code, Some(ReasonCode::TrialLimit));
    assert_eq!(page.message.as_deref(), Some("超出试读范围，请购买后继续阅读"));
    assert_invariants(&page);
}

#[tokio::test]
async fn business_denial_without_message_falls_back() {
    let stub = StubTransport::new();
    stub.denied(WEBP, None);
    let page = PageAccessResolver::new(stub).resolve_page("b1", 40, RenderMode::Crop).await;

    assert_eq!(page.status, PageStatus::Locked);
    assert_eq!(page.reason_code, Some(ReasonCode::TrialLimit));
    assert_eq!(page.message.as_deref(), Some(TRIAL_LIMIT_MESSAGE));
    assert_eq!(page.message.as_deref(), Some("试读结束，购买后解锁全文"));
}

#[tokio::test]
async fn forbidden_transport_is_locked_regardless_of_payload() {
    let stub = StubTransport::new();
    stub.fail(WEBP, PortError::Forbidden);
    let page = PageAccessResolver::new(stub).resolve_page("b1", 40, RenderMode::Crop).await;

    assert_eq!(page.status, PageStatus::Locked);
    assert_eq!(page.reason_code, None);
    assert_eq!(page.message.as_deref(), Some(TRIAL_LIMIT_MESSAGE));
    assert_invariants(&page);
}

#[tokio::test]
async fn transport_failures_are_error_pages() {
    for err in [
        PortError::Unreachable("connection refused".into()),
        PortError::Status(502),
        PortError::Unauthorized,
        PortError::Malformed("not json".into()),
    ] {
        let stub = StubTransport::new();
        stub.fail(WEBP, err.clone());
        let page = PageAccessResolver::new(stub).resolve_page("b1", 2, RenderMode::Crop).await;

        assert_eq!(page.status, PageStatus::Error, "{:?}", err);
        assert_eq!(page.message.as_deref(), Some(NETWORK_ERROR_MESSAGE));
        assert_eq!(page.reason_code, None);
        assert_invariants(&page);
    }
}

#[tokio::test]
async fn flag_true_without_url_is_never_allowed() {
    for data in [None, Some(json!("")), Some(json!(null)), Some(json!({"url": "x"}))] {
        let stub = StubTransport::new();
        stub.reply(
            WEBP,
            Ok(BackendReply {
                flag: true,
                data,
                message: None,
                http_status: 200,
            }),
        );
        let page = PageAccessResolver::new(stub).resolve_page("b1", 2, RenderMode::Crop).await;
        assert_eq!(page.status, PageStatus::Error);
        assert_invariants(&page);
    }
}

//=========================================================================================
// Annotations
//=========================================================================================

const TERMS: &str = "/pageTerm/query/all";
const NOTES: &str = "/bookNote/query/all";
const ATTACHMENTS: &str = "/pageAttachment/query/all";
const ATTACHMENT_URL: &str = "/pageAttachment/storage/signedUrl/download";

fn seeded_annotations() -> std::sync::Arc<StubTransport> {
    let stub = StubTransport::new();
    stub.ok(
        TERMS,
        json!([{
            "bookId": "b1", "pageNo": 5, "termId": "t1", "termKey": "熵",
            "termExplanation": "无序程度的度量", "rectsJson": [[10, 20, 30, 8]]
        }]),
    )
    .ok(
        NOTES,
        json!([{
            "modelId": "n1", "bookId": "b1", "pageNo": 5, "noteContent": "重读",
            "highlightRects": [[1.5, 2.0, 100, 12], [1.5, 16.0, 80, 12]],
            "highlightColor": "#ffeb3b", "isPrivate": "1"
        }]),
    )
    .ok(
        ATTACHMENTS,
        json!([{
            "modelId": "a1", "bookId": "b1", "pageNo": 5, "displayName": "讲义.pdf",
            "attachmentType": "pdf", "attachmentTypeDisplay": "PDF",
            "filePath": "books/b1/a1.pdf", "extraData": {"pages": 3, "tags": ["x"]}
        }]),
    );
    stub
}

#[tokio::test]
async fn annotations_decode_with_rects_and_opaque_extra_data() {
    let stub = seeded_annotations();
    let aggregator = PageAnnotationAggregator::new(stub.clone());

    let terms = aggregator.fetch_terms("b1", 5, RenderMode::Crop).await;
    assert_eq!(terms.len(), 1);
    assert_eq!(terms[0].rects_json, vec![Rect(10.0, 20.0, 30.0, 8.0)]);

    let notes = aggregator.fetch_notes("b1", 5, RenderMode::Origin).await;
    assert_eq!(notes[0].highlight_rects.len(), 2);
    assert_eq!(notes[0].highlight_color.as_deref(), Some("#ffeb3b"));

    let attachments = aggregator.fetch_attachments("b1", 5, RenderMode::Crop).await;
    assert_eq!(
        attachments[0].extra_data,
        Some(json!({"pages": 3, "tags": ["x"]}))
    );

    let note_call = &stub.calls_to(NOTES)[0];
    assert_eq!(
        json_body(note_call),
        &json!({"bookId": "b1", "pageNo": 5, "imageMode": "origin"})
    );
}

#[tokio::test]
async fn fetch_all_collects_every_overlay_in_one_mode() {
    let aggregator = PageAnnotationAggregator::new(seeded_annotations());

    let set = aggregator.fetch_all("b1", 5, RenderMode::Origin).await;

    assert_eq!(set.mode, RenderMode::Origin);
    assert_eq!((set.terms.len(), set.notes.len(), set.attachments.len()), (1, 1, 1));
    assert!(!set.is_empty());
}

#[tokio::test]
async fn annotation_failures_become_empty_sequences() {
    let stub = StubTransport::new();
    stub.fail(TERMS, PortError::Unreachable("timeout".into()))
        .denied(NOTES, Some("no access"))
        .ok(ATTACHMENTS, json!({"unexpected": "shape"}));
    let aggregator = PageAnnotationAggregator::new(stub);

    assert!(aggregator.fetch_terms("b1", 1, RenderMode::Crop).await.is_empty());
    assert!(aggregator.fetch_notes("b1", 1, RenderMode::Crop).await.is_empty());
    assert!(aggregator.fetch_attachments("b1", 1, RenderMode::Crop).await.is_empty());
    assert!(aggregator.fetch_all("b1", 1, RenderMode::Crop).await.is_empty());
}

#[tokio::test]
async fn attachment_url_is_signed_through_a_form_request() {
    let stub = StubTransport::new();
    stub.ok(ATTACHMENT_URL, json!("https://oss.example/a1.pdf?sig=abc"));
    let aggregator = PageAnnotationAggregator::new(stub.clone());

    let url = aggregator.resolve_attachment_url("books/b1/a1.pdf").await;

    assert_eq!(url, "https://oss.example/a1.pdf?sig=abc");
    assert_eq!(
        stub.calls()[0].payload,
        Payload::Form(vec![("objectKey".into(), "books/b1/a1.pdf".into())])
    );
}

#[tokio::test]
async fn attachment_url_failures_are_empty_strings() {
    let stub = StubTransport::new();
    stub.fail(ATTACHMENT_URL, PortError::Status(500));
    let aggregator = PageAnnotationAggregator::new(stub.clone());
    assert_eq!(aggregator.resolve_attachment_url("k").await, "");

    stub.denied(ATTACHMENT_URL, None);
    assert_eq!(aggregator.resolve_attachment_url("k").await, "");

    assert_eq!(aggregator.resolve_attachment_url("").await, "");
    assert_eq!(stub.calls().len(), 2);
}

#[tokio::test]
async fn null_overlay_fields_do_not_drop_the_page() {
    let stub = StubTransport::new();
    stub.ok(
        NOTES,
        json!([
            {"modelId": "n1", "bookId": "b1", "pageNo": 5, "noteContent": "a",
             "highlightRects": [[1, 2, 3, 4]], "isPrivate": "0"},
            {"modelId": "n2", "bookId": "b1", "pageNo": 5, "noteContent": null,
             "highlightRects": null, "highlightColor": null, "isPrivate": null}
        ]),
    )
    .ok(
        TERMS,
        json!([
            {"bookId": "b1", "pageNo": 5, "termId": "t1", "termKey": "熵",
             "termExplanation": "无序程度的度量", "rectsJson": [[10, 20, 30, 8]]},
            {"bookId": "b1", "pageNo": 5, "termId": "t2", "termKey": null,
             "termExplanation": null, "rectsJson": null}
        ]),
    );
    let aggregator = PageAnnotationAggregator::new(stub);

    let notes = aggregator.fetch_notes("b1", 5, RenderMode::Crop).await;
    assert_eq!(notes.len(), 2);
    assert!(notes[1].highlight_rects.is_empty());
    assert_eq!(notes[1].note_content, "");

    let terms = aggregator.fetch_terms("b1", 5, RenderMode::Crop).await;
    assert_eq!(terms.len(), 2);
    assert_eq!(terms[1].term_explanation, "");
    assert!(terms[1].rects_json.is_empty());
}

#[tokio::test]
async fn undecodable_overlay_row_is_skipped() {
    let stub = StubTransport::new();
    stub.ok(
        ATTACHMENTS,
        json!([
            {"modelId": "a1", "bookId": "b1", "pageNo": 5, "displayName": "x", "filePath": "k1"},
            {"modelId": "a2", "bookId": "b1", "pageNo": "five", "filePath": "k2"}
        ]),
    );
    let attachments = PageAnnotationAggregator::new(stub)
        .fetch_attachments("b1", 5, RenderMode::Crop)
        .await;
    assert_eq!(attachments.len(), 1);
    assert_eq!(attachments[0].file_path, "k1");
}
