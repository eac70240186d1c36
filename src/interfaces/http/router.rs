use crate::application::payout::{PayoutEngine, PayoutReceipt};
use crate::domain::application::Application;
use crate::domain::event::Event;
use crate::domain::wallet::{Wallet, WalletTransaction};
use crate::error::PayoutError;
use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<PayoutEngine>,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn error_response(err: PayoutError) -> ApiError {
    let status = match err {
        PayoutError::EventNotFound(_)
        | PayoutError::ApplicationNotFound(_)
        | PayoutError::WalletNotFound(_) => StatusCode::NOT_FOUND,
        PayoutError::AlreadyFinished(_) | PayoutError::ValidationError(_) => {
            StatusCode::BAD_REQUEST
        }
        PayoutError::StoreError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
    }
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub creator_id: Uuid,
    pub salary: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub worker_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawRequest {
    pub amount: Decimal,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessedApplication {
    pub application_id: Uuid,
    pub worker_id: Uuid,
}

impl From<PayoutReceipt> for ProcessedApplication {
    fn from(receipt: PayoutReceipt) -> Self {
        Self {
            application_id: receipt.application_id,
            worker_id: receipt.worker_id,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    pub message: String,
    pub processed_count: usize,
    pub processed: Vec<ProcessedApplication>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletStatementResponse {
    pub wallet: Wallet,
    pub transactions: Vec<WalletTransaction>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/events", post(create_event))
        .route("/events/:id", get(get_event))
        .route("/events/:id/finish", post(finish_event))
        .route("/events/:id/applications", post(apply_to_event))
        .route("/applications/:id/clock-in", post(clock_in))
        .route("/applications/:id/clock-out", post(clock_out))
        .route("/wallets/:worker_id", get(wallet_statement))
        .route("/wallets/:worker_id/withdrawals", post(withdraw))
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}

async fn create_event(
    State(state): State<AppState>,
    Json(request): Json<CreateEventRequest>,
) -> Result<Json<Event>, ApiError> {
    state
        .engine
        .create_event(request.creator_id, request.salary)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Event>, ApiError> {
    state
        .engine
        .get_event(event_id)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn finish_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<FinishResponse>, ApiError> {
    let summary = state
        .engine
        .finish_event(event_id)
        .await
        .map_err(error_response)?;
    let processed: Vec<ProcessedApplication> =
        summary.processed.into_iter().map(Into::into).collect();
    Ok(Json(FinishResponse {
        message: "event finished".to_string(),
        processed_count: processed.len(),
        processed,
    }))
}

async fn apply_to_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<ApplyRequest>,
) -> Result<Json<Application>, ApiError> {
    state
        .engine
        .apply(event_id, request.worker_id)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn clock_in(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
) -> Result<Json<Application>, ApiError> {
    state
        .engine
        .clock_in(application_id)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn clock_out(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
) -> Result<Json<Application>, ApiError> {
    state
        .engine
        .clock_out(application_id)
        .await
        .map(Json)
        .map_err(error_response)
}

async fn wallet_statement(
    State(state): State<AppState>,
    Path(worker_id): Path<Uuid>,
) -> Result<Json<WalletStatementResponse>, ApiError> {
    let (wallet, transactions) = state
        .engine
        .wallet_statement(worker_id)
        .await
        .map_err(error_response)?;
    Ok(Json(WalletStatementResponse {
        wallet,
        transactions,
    }))
}

async fn withdraw(
    State(state): State<AppState>,
    Path(worker_id): Path<Uuid>,
    Json(request): Json<WithdrawRequest>,
) -> Result<Json<Wallet>, ApiError> {
    state
        .engine
        .withdraw(worker_id, request.amount)
        .await
        .map(Json)
        .map_err(error_response)
}
