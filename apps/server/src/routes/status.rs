use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;
use serde_json::json;

use super::AppState;
use crate::monitoring::types::TIMESTAMP_FORMAT;
use crate::storage::Watermark;

/// Most recent observation across all devices, or the NO DATA sentinel
/// when nothing has been recorded yet.
#[get("/status")]
pub async fn current_status(state: web::Data<AppState>) -> impl Responder {
    let observations = match state.log.read_all().await {
        Ok(observations) => observations,
        Err(error) => {
            tracing::error!("failed to read status log: {error:#}");
            return HttpResponse::InternalServerError()
                .json(json!({ "error": "status log unavailable" }));
        }
    };

    match observations.last() {
        Some(latest) => HttpResponse::Ok().json(json!({
            "status": latest.status,
            "timestamp": latest.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            "device_name": latest.device_name,
            "address": latest.address,
        })),
        None => HttpResponse::Ok().json(json!({ "status": "NO DATA" })),
    }
}

#[derive(Debug, Deserialize)]
pub struct ChangedQuery {
    /// Watermark the client last observed; 0 means "never saw anything".
    #[serde(default)]
    checkpoint: i64,
}

/// Staleness check: has anything been appended since `checkpoint`?
///
/// A `changed: true` answer tells the client to re-read and adopt the
/// returned watermark as its next checkpoint.
#[get("/changed")]
pub async fn changed(
    state: web::Data<AppState>,
    query: web::Query<ChangedQuery>,
) -> impl Responder {
    let checkpoint = Watermark::from_millis(query.checkpoint);

    HttpResponse::Ok().json(json!({
        "changed": state.oracle.has_changed(checkpoint),
        "watermark": state.oracle.watermark(),
    }))
}
