//! Route-level tests driven through the router with a stubbed capture
//! backend, so no browser is needed.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bigdecimal::BigDecimal;
use http_body_util::BodyExt;
use quotation_pdf::{
    codec, CaptureBackend, Error, ExportConfig, Exporter, LineItemBuilder,
    QuotationDocumentBuilder, QuoteMetaBuilder,
};
use quotation_pdf_server::{app, AppState};
use tower::ServiceExt;

const STUB_PDF: &[u8] = b"%PDF-1.4 stub";

struct StubCapture;

#[async_trait]
impl CaptureBackend for StubCapture {
    async fn capture(&self, _url: &str) -> Result<Vec<u8>, Error> {
        Ok(STUB_PDF.to_vec())
    }
}

fn test_app() -> Router {
    let exporter = Exporter::with_backend(ExportConfig::default(), Arc::new(StubCapture));
    app(AppState {
        exporter: Arc::new(exporter),
    })
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let response = test_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn print_without_token_renders_a_placeholder() {
    let response = test_app()
        .oneshot(Request::get("/print").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("No quotation data supplied"));
}

#[tokio::test]
async fn print_with_corrupted_token_renders_an_invalid_data_message() {
    let response = test_app()
        .oneshot(
            Request::get("/print?q=this-is-not*valid*base64")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("Invalid quotation data"));
}

#[tokio::test]
async fn print_with_valid_token_renders_the_quotation() {
    let document = QuotationDocumentBuilder::default()
        .meta(
            QuoteMetaBuilder::default()
                .quotation_number("Q-ROUTE-1")
                .build()
                .unwrap(),
        )
        .add_item(
            LineItemBuilder::default()
                .label("Pump")
                .description("Circulation pump")
                .quantity(BigDecimal::from(2))
                .unit_price(BigDecimal::from(120))
                .taxed(true)
                .build()
                .unwrap(),
        )
        .tax_rate_percent(BigDecimal::from(20))
        .build()
        .unwrap();
    let token = codec::encode(&document).unwrap();

    let response = test_app()
        .oneshot(
            Request::get(format!("/print?q={token}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("id=\"quotation\""));
    assert!(body.contains("Q-ROUTE-1"));
    assert!(body.contains("Pump"));
}

#[tokio::test]
async fn export_returns_a_pdf_attachment() {
    let response = test_app()
        .oneshot(
            Request::post("/export")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"meta": {"quotationNumber": "Q-1"}, "items": []}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"Q-1.pdf\""
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(bytes.as_ref(), STUB_PDF);
}

#[tokio::test]
async fn export_rejects_non_object_bodies() {
    let response = test_app()
        .oneshot(
            Request::post("/export")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("[1, 2, 3]"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("\"kind\":\"bad_request\""));
}

#[tokio::test]
async fn export_reports_unparseable_json_as_bad_request() {
    let response = test_app()
        .oneshot(
            Request::post("/export")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not valid json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let body = body_string(response).await;
    assert!(body.contains("\"kind\":\"bad_request\""));
    assert!(body.contains("\"detail\""));
}

#[tokio::test]
async fn export_accepts_alias_field_names() {
    let response = test_app()
        .oneshot(
            Request::post("/export")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    r#"{"mt": {"qn": "Q-ALIAS"}, "it": [{"l": "Pump", "q": 1, "up": 10}]}"#,
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=\"Q-ALIAS.pdf\""
    );
}
