//! REST API endpoints for Autho.D.oX.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tracing::info;

use crate::domain::{ContentId, ResolvedContent};
use crate::infra::AuthodoxError;
use crate::server::AppState;
use crate::submission::RecordingProgress;
use crate::wallet::SessionSnapshot;

use super::error::{ledger_not_configured, ApiError, ErrorCode};
use super::types::{
    AuthorQuery, KeyStatusResponse, ProofListResponse, SubmitProofRequest, SubmitProofResponse,
};

/// Build the `/api` router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/proofs", post(submit_proof))
        .route("/v1/proofs", get(list_proofs))
        .route("/v1/cache/proofs", get(list_cached_proofs))
        .route("/v1/content/:content_id", get(get_content))
        // Wallet session
        .route("/v1/wallet", get(get_wallet))
        .route("/v1/wallet/connect", post(connect_wallet))
        .route("/v1/wallet/disconnect", post(disconnect_wallet))
        // Diagnostics
        .route("/v1/debug/key-status", get(get_key_status))
}

async fn submit_proof(
    State(state): State<AppState>,
    Json(request): Json<SubmitProofRequest>,
) -> Result<(StatusCode, Json<SubmitProofResponse>), ApiError> {
    let flow = state.submission.as_ref().ok_or_else(ledger_not_configured)?;
    let request = request.into_submission()?;

    let progress = RecordingProgress::new();
    let outcome = flow.submit(&request, &progress).await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitProofResponse {
            outcome,
            stages: progress.stages(),
        }),
    ))
}

async fn list_proofs(
    State(state): State<AppState>,
    Query(query): Query<AuthorQuery>,
) -> Result<Json<ProofListResponse>, ApiError> {
    let view = state.gallery.list(query.author()).await?;

    Ok(Json(ProofListResponse {
        count: view.records.len(),
        proofs: view.records,
        chain_scan_complete: Some(view.chain_scan_complete),
    }))
}

async fn list_cached_proofs(
    State(state): State<AppState>,
    Query(query): Query<AuthorQuery>,
) -> Result<Json<ProofListResponse>, ApiError> {
    let proofs = match query.author() {
        Some(author) => state.cache.query_by_author(author).await?,
        None => state.cache.query_all().await?,
    };

    Ok(Json(ProofListResponse {
        count: proofs.len(),
        proofs,
        chain_scan_complete: None,
    }))
}

async fn get_content(
    State(state): State<AppState>,
    Path(content_id): Path<String>,
) -> Result<Json<ResolvedContent>, ApiError> {
    let id = ContentId::new(content_id);
    let content = state.resolver.resolve(&id).await.map_err(|e| match e {
        AuthodoxError::NotFound(_) => {
            ApiError::new(ErrorCode::ContentNotFound, format!("No content for {id}"))
                .with_resource_id(id.as_str())
        }
        other => other.into(),
    })?;
    Ok(Json(content))
}

async fn get_wallet(State(state): State<AppState>) -> Json<SessionSnapshot> {
    Json(state.session.snapshot())
}

async fn connect_wallet(
    State(state): State<AppState>,
) -> Result<Json<SessionSnapshot>, ApiError> {
    let provider = state.wallet.as_ref().ok_or_else(ledger_not_configured)?;
    state.session.connect(provider.as_ref()).await?;
    Ok(Json(state.session.snapshot()))
}

async fn disconnect_wallet(State(state): State<AppState>) -> Json<SessionSnapshot> {
    state.session.disconnect();
    Json(state.session.snapshot())
}

async fn get_key_status(State(state): State<AppState>) -> Json<KeyStatusResponse> {
    let status = state.key_status;
    info!(?status, "Pinata key status requested");
    Json(status.into())
}
