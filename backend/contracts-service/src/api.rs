//! Axum REST API handlers.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, put},
    Json, Router,
};
use intermediation::{Contract, ContractId, NewContract, Transition};
use serde::Serialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::db;
use crate::errors::{Result, ServiceError};
use crate::render::{DocumentSnapshot, Renderer};

#[derive(Clone)]
pub struct ApiState {
    pub pool: SqlitePool,
    pub renderer: Arc<Renderer>,
}

pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/contracts", get(list_contracts).post(create_contract))
        .route("/contracts/pdf/demo", get(demo_pdf))
        .route("/contracts/:id", get(get_contract))
        .route("/contracts/:id/accept", put(accept_contract))
        .route("/contracts/:id/reject", put(reject_contract))
        .route("/contracts/:id/pdf", get(download_pdf))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ContractDocumentResponse {
    pub message: &'static str,
    pub contract: Contract,
    /// Path of the rendered document; `null` when rendering failed.
    pub pdf: Option<String>,
    /// Why the document is missing. The contract change is committed either way.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub render_error: Option<String>,
}

#[derive(Serialize)]
pub struct ContractsResponse {
    pub count: usize,
    pub contracts: Vec<Contract>,
}

// ─────────────────────────────────────────────────────────
// Rendering helpers
// ─────────────────────────────────────────────────────────

/// Render on the blocking pool; typesetting and file I/O are synchronous.
async fn render(renderer: &Arc<Renderer>, snapshot: DocumentSnapshot) -> Result<PathBuf> {
    let renderer = Arc::clone(renderer);
    let path = tokio::task::spawn_blocking(move || renderer.render(&snapshot)).await??;
    info!("Rendered {}", path.display());
    Ok(path)
}

/// The contract is already committed, so a render failure is reported in
/// the body instead of failing the request.
async fn respond_with_document(
    state: &ApiState,
    message: &'static str,
    contract: Contract,
) -> Json<ContractDocumentResponse> {
    let (pdf, render_error) =
        match render(&state.renderer, DocumentSnapshot::from_contract(&contract)).await {
            Ok(path) => (Some(path.display().to_string()), None),
            Err(e) => {
                error!("Contract {} saved but its document failed: {e}", contract.id);
                (None, Some(e.to_string()))
            }
        };
    Json(ContractDocumentResponse {
        message,
        contract,
        pdf,
        render_error,
    })
}

fn pdf_response(file_name: String, bytes: Vec<u8>) -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        bytes,
    )
}

// ─────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────

/// `GET /`
pub async fn root() -> impl IntoResponse {
    Json(MessageResponse {
        message: "Contracts service is running",
    })
}

/// `GET /health`
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /contracts`
///
/// Creates a `PENDING` contract and renders its first document.
pub async fn create_contract(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<NewContract>,
) -> Result<impl IntoResponse> {
    let contract = db::insert_contract(&state.pool, &request).await?;
    info!(
        "Contract {} created (investor {}, broker {})",
        contract.id, contract.investor_ref, contract.broker_ref
    );
    let body = respond_with_document(&state, "Contract created", contract).await;
    Ok((StatusCode::CREATED, body))
}

/// `GET /contracts`
pub async fn list_contracts(State(state): State<Arc<ApiState>>) -> Result<Json<ContractsResponse>> {
    let contracts = db::list_contracts(&state.pool).await?;
    Ok(Json(ContractsResponse {
        count: contracts.len(),
        contracts,
    }))
}

/// `GET /contracts/:id`
pub async fn get_contract(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<ContractId>,
) -> Result<Json<Contract>> {
    Ok(Json(db::get_contract(&state.pool, id).await?))
}

async fn transition(
    state: &ApiState,
    id: ContractId,
    transition: Transition,
    message: &'static str,
) -> Result<Json<ContractDocumentResponse>> {
    let contract = db::transition_contract(&state.pool, id, transition).await?;
    info!("Contract {id} is now {}", contract.status);
    Ok(respond_with_document(state, message, contract).await)
}

/// `PUT /contracts/:id/accept`
pub async fn accept_contract(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<ContractId>,
) -> Result<Json<ContractDocumentResponse>> {
    transition(&state, id, Transition::Accept, "Contract accepted").await
}

/// `PUT /contracts/:id/reject`
pub async fn reject_contract(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<ContractId>,
) -> Result<Json<ContractDocumentResponse>> {
    transition(&state, id, Transition::Reject, "Contract rejected").await
}

/// `GET /contracts/:id/pdf`
///
/// Serves the last rendered document; nothing is regenerated here.
pub async fn download_pdf(
    State(state): State<Arc<ApiState>>,
    Path(id): Path<ContractId>,
) -> Result<impl IntoResponse> {
    let path = state.renderer.document_path(&id.to_string());
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServiceError::DocumentNotFound(format!("PDF for contract {id}")));
        }
        Err(e) => return Err(e.into()),
    };
    let file_name = crate::render::file_name(&id.to_string());
    Ok(pdf_response(file_name, bytes))
}

/// `GET /contracts/pdf/demo`
///
/// Renders the sample document and returns it inline.
pub async fn demo_pdf(State(state): State<Arc<ApiState>>) -> Result<impl IntoResponse> {
    let snapshot = DocumentSnapshot::demo();
    let file_name = crate::render::file_name(&snapshot.contract_id);
    let path = render(&state.renderer, snapshot).await?;
    let bytes = tokio::fs::read(&path).await?;
    Ok(pdf_response(file_name, bytes))
}
