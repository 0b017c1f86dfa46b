use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use super::domain::ReportEntity;
use super::export::ExportError;
use super::filter::{FilterSpec, PageRequest};
use super::session::{ReportError, ReportService};
use super::store::ReportStore;

/// Wire shape of a list request. Raw filter values stay untyped here; the
/// filter layer normalizes them permissively.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRequest {
    #[serde(default)]
    pub filters: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub group_by: Option<String>,
}

/// Wire shape of an export request. The format travels as a raw string so
/// unsupported values fail inside the engine, ahead of any store access.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub filters: BTreeMap<String, serde_json::Value>,
    pub format: String,
}

/// Router builder exposing the report query and export endpoints.
pub fn report_router<S>(service: Arc<ReportService<S>>) -> Router
where
    S: ReportStore + 'static,
{
    Router::new()
        .route("/api/v1/reports/:entity/query", post(query_handler::<S>))
        .route("/api/v1/reports/:entity/export", post(export_handler::<S>))
        .with_state(service)
}

pub(crate) async fn query_handler<S>(
    State(service): State<Arc<ReportService<S>>>,
    Path(entity): Path<String>,
    axum::Json(request): axum::Json<ListRequest>,
) -> Response
where
    S: ReportStore + 'static,
{
    let Some(entity) = ReportEntity::from_slug(&entity) else {
        return unknown_entity_response(&entity);
    };

    let spec = FilterSpec::from_raw(entity, &request.filters);
    let page = PageRequest::new(
        request.page.unwrap_or(1),
        request
            .page_size
            .unwrap_or(service.options().default_page_size),
    );

    match service.list(entity, &spec, page, request.group_by.as_deref()) {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(error) => failure_response(error),
    }
}

pub(crate) async fn export_handler<S>(
    State(service): State<Arc<ReportService<S>>>,
    Path(entity): Path<String>,
    axum::Json(request): axum::Json<ExportRequest>,
) -> Response
where
    S: ReportStore + 'static,
{
    let Some(entity) = ReportEntity::from_slug(&entity) else {
        return unknown_entity_response(&entity);
    };

    let spec = FilterSpec::from_raw(entity, &request.filters);

    match service.export(entity, &spec, &request.format) {
        Ok(file) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, file.content_type.to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", file.file_name),
                ),
            ],
            file.bytes,
        )
            .into_response(),
        Err(error) => failure_response(error),
    }
}

fn unknown_entity_response(slug: &str) -> Response {
    let payload = json!({
        "error": format!("unknown report entity '{slug}'"),
    });
    (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
}

fn failure_response(error: ReportError) -> Response {
    let status = match &error {
        ReportError::Export(ExportError::UnsupportedFormat(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        ReportError::Export(ExportError::TooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
        ReportError::Export(_) | ReportError::Store(_) => {
            warn!(%error, "report request failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({
        "error": error.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
