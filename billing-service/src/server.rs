//! Thin HTTP adapter over [`BillingService`].

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::handlers::{BillingService, InvocationResponse};

#[derive(Debug, Deserialize)]
struct MonthParams {
    month: Option<String>,
}

impl IntoResponse for InvocationResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status.code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.body)).into_response()
    }
}

pub fn router(service: Arc<BillingService>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/anomaly-scan", get(anomaly_scan).post(anomaly_scan))
        .route("/billing", get(monthly_billing))
        .with_state(service)
}

pub async fn serve(bind_addr: &str, service: Arc<BillingService>) -> anyhow::Result<()> {
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid server.bind_addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "billing service listening");
    axum::serve(listener, router(service).into_make_service()).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn anomaly_scan(State(service): State<Arc<BillingService>>) -> InvocationResponse {
    service.anomaly_scan().await
}

async fn monthly_billing(
    State(service): State<Arc<BillingService>>,
    Query(params): Query<MonthParams>,
) -> InvocationResponse {
    service.monthly_query(params.month.as_deref()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::Status;
    use serde_json::json;

    #[test]
    fn response_status_maps_onto_http() {
        let cases = [
            (Status::Ok, StatusCode::OK),
            (Status::BadRequest, StatusCode::BAD_REQUEST),
            (Status::NotFound, StatusCode::NOT_FOUND),
            (Status::SchemaError, StatusCode::UNPROCESSABLE_ENTITY),
            (Status::InternalError, StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (status, expected) in cases {
            let response = InvocationResponse {
                status,
                body: json!({ "error": "x" }),
            }
            .into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
