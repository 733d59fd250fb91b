//! HTTP surface: export endpoint, print host page, health probe.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use quotation_pdf::{
    calc, codec,
    error::{Error, ErrorKind},
    render, Exporter,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub exporter: Arc<Exporter>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/print", get(print_page))
        .route("/export", post(export_pdf))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "quotation-pdf-server",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[derive(Debug, Deserialize)]
struct PrintParams {
    q: Option<String>,
}

/// The print host page. Driven by humans and by the headless capture step
/// through the identical code path; invalid or missing tokens are rendered
/// states, never server errors.
async fn print_page(Query(params): Query<PrintParams>) -> Html<String> {
    let token = params.q.as_deref().map(str::trim).filter(|t| !t.is_empty());
    let Some(token) = token else {
        return Html(message_page(
            "Quotation preview",
            "No quotation data supplied. Open this page through a quotation link.",
        ));
    };
    let document = match codec::decode(token) {
        Ok(document) => document,
        Err(error) => {
            tracing::warn!(kind = error.kind_name(), error = %error, "unusable quotation token");
            let detail = match error.kind() {
                ErrorKind::MalformedToken(_) => {
                    "The quotation data in this link could not be decoded."
                }
                _ => "The data in this link is not a valid quotation.",
            };
            return Html(message_page("Invalid quotation data", detail));
        }
    };
    let totals = calc::totals(
        &document.items,
        &document.tax_rate_percent,
        &document.carriage,
    );
    match render::render(&document, &totals) {
        Ok(html) => Html(html),
        Err(error) => {
            tracing::error!(error = %error, "rendering quotation page failed");
            Html(message_page(
                "Invalid quotation data",
                "The quotation could not be rendered.",
            ))
        }
    }
}

async fn export_pdf(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    // A body that is not parseable JSON is a caller error like any other;
    // it gets the same `{kind, detail}` shape instead of the extractor's
    // plain-text rejection.
    let Json(body) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(
                Error::bad_request(rejection.body_text()).add_context("reading request body"),
            );
        }
    };
    let exporter = state.exporter.clone();
    // Detached task: a caller disconnect must not cancel browser teardown.
    let outcome = tokio::spawn(async move { exporter.export(body).await }).await;
    match outcome {
        Ok(Ok(pdf)) => {
            tracing::info!(filename = %pdf.filename, bytes = pdf.bytes.len(), "export complete");
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (
                        header::CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{}\"", pdf.filename),
                    ),
                ],
                pdf.bytes,
            )
                .into_response()
        }
        Ok(Err(error)) => error_response(error),
        Err(join_error) => error_response(
            Error::from(join_error.to_string()).add_context("running export task"),
        ),
    }
}

fn error_response(error: Error) -> Response {
    let status = match error.kind() {
        ErrorKind::BadRequest(_) => StatusCode::BAD_REQUEST,
        ErrorKind::RenderTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Navigation(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(kind = error.kind_name(), error = %error, "export failed");
    } else {
        tracing::warn!(kind = error.kind_name(), error = %error, "export rejected");
    }
    (
        status,
        Json(json!({
            "kind": error.kind_name(),
            "detail": error.to_string(),
        })),
    )
        .into_response()
}

fn message_page(title: &str, detail: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>body{{font-family:Helvetica,Arial,sans-serif;margin:48px;color:#1a1a1a}}\
         .panel{{border:1px solid #ccc;padding:24px;max-width:480px}}</style></head>\n\
         <body><div class=\"panel\"><h1>{title}</h1><p>{detail}</p></div></body>\n</html>\n"
    )
}
