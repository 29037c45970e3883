//! Sheet API endpoints

use crate::error::SheetError;
use crate::sheets::{
    column_catalog, compose_columns, CatalogGroup, CellUpdate, ColumnDeclaration,
    InstanceRequest, InstanceSummary, LoadedInstance, NewSheet, ResolveRequest, ResolvedTable,
    SheetAssembler, SheetDefinition, SheetStore, SheetSummary,
};
use crate::store::RanchStore;
use axum::{
    extract::{rejection::PathRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct SheetState {
    sheets: Arc<dyn SheetStore>,
    assembler: Arc<SheetAssembler>,
}

impl SheetState {
    pub fn new(sheets: Arc<dyn SheetStore>, ranch: Arc<dyn RanchStore>) -> Self {
        Self {
            assembler: Arc::new(SheetAssembler::new(sheets.clone(), ranch)),
            sheets,
        }
    }
}

// Request types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSheetRequest {
    pub name: String,
    pub columns: Vec<ColumnDeclaration>,
    #[serde(default)]
    pub fillable_columns: Vec<ColumnDeclaration>,
    #[serde(default)]
    pub created_by: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSheetRequest {
    pub name: String,
    pub columns: Vec<ColumnDeclaration>,
    #[serde(default)]
    pub fillable_columns: Vec<ColumnDeclaration>,
}

// Response types
#[derive(Debug, Serialize)]
pub struct SheetListResponse {
    pub sheets: Vec<SheetSummary>,
}

#[derive(Debug, Serialize)]
pub struct InstanceListResponse {
    pub instances: Vec<InstanceSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceCreatedResponse {
    pub success: bool,
    pub instance_id: i32,
}

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub groups: Vec<CatalogGroup>,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i32>,
}

impl SuccessResponse {
    fn ok() -> Self {
        Self {
            success: true,
            id: None,
        }
    }

    fn created(id: i32) -> Self {
        Self {
            success: true,
            id: Some(id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Maps sheet errors and malformed paths onto HTTP statuses
pub enum ApiError {
    Sheet(SheetError),
    Path(PathRejection),
}

impl From<SheetError> for ApiError {
    fn from(err: SheetError) -> Self {
        ApiError::Sheet(err)
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Path(rejection)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Sheet(err) => match err {
                SheetError::NotFound(_) | SheetError::InstanceNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                SheetError::Locked(_) => StatusCode::CONFLICT,
                SheetError::InvalidDefinition(_) | SheetError::InvalidCellUpdate(_) => {
                    StatusCode::BAD_REQUEST
                }
                SheetError::Serialization(_) | SheetError::Store(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Path(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Sheet(err) => err.to_string(),
            ApiError::Path(rejection) => rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::Sheet(err) = &self {
            if status.is_server_error() {
                error!("Sheet request failed: {:#}", err);
            }
        }
        (
            status,
            Json(ErrorResponse {
                success: false,
                error: self.message(),
            }),
        )
            .into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

/// Numeric id path segment; a malformed id is a JSON 400
type IdPath = Result<Path<i32>, PathRejection>;

fn path_id(path: IdPath) -> Result<i32, ApiError> {
    let Path(id) = path?;
    Ok(id)
}

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /api/sheets
async fn list_sheets(State(state): State<SheetState>) -> ApiResult<SheetListResponse> {
    let sheets = state.sheets.list().await?;
    Ok(Json(SheetListResponse { sheets }))
}

/// GET /api/sheets/available-columns
async fn available_columns() -> Json<CatalogResponse> {
    Json(CatalogResponse {
        groups: column_catalog(),
    })
}

/// GET /api/sheets/:id
async fn get_sheet(State(state): State<SheetState>, path: IdPath) -> ApiResult<SheetDefinition> {
    let id = path_id(path)?;
    Ok(Json(state.sheets.require(id).await?))
}

/// POST /api/sheets
async fn create_sheet(
    State(state): State<SheetState>,
    Json(req): Json<CreateSheetRequest>,
) -> ApiResult<SuccessResponse> {
    let columns = compose_columns(req.columns, req.fillable_columns);
    let created_by = req.created_by.unwrap_or_else(|| "Unknown".to_string());
    let id = state
        .sheets
        .create(NewSheet::new(req.name, columns, created_by))
        .await?;
    Ok(Json(SuccessResponse::created(id)))
}

/// PUT /api/sheets/:id
async fn update_sheet(
    State(state): State<SheetState>,
    path: IdPath,
    Json(req): Json<UpdateSheetRequest>,
) -> ApiResult<SuccessResponse> {
    let id = path_id(path)?;
    let columns = compose_columns(req.columns, req.fillable_columns);
    state.sheets.update(id, &req.name, &columns).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// DELETE /api/sheets/:id
async fn delete_sheet(State(state): State<SheetState>, path: IdPath) -> ApiResult<SuccessResponse> {
    let id = path_id(path)?;
    state.sheets.delete(id).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// POST /api/sheets/load
async fn load_sheet(
    State(state): State<SheetState>,
    Json(req): Json<ResolveRequest>,
) -> ApiResult<ResolvedTable> {
    info!(
        "Loading sheet {} (herd: {:?}, breeding year: {:?})",
        req.sheet_id, req.herd_name, req.breeding_year
    );
    Ok(Json(state.assembler.resolve_sheet(&req).await?))
}

/// GET /api/sheets/:id/instances
async fn list_sheet_instances(
    State(state): State<SheetState>,
    path: IdPath,
) -> ApiResult<InstanceListResponse> {
    let id = path_id(path)?;
    state.sheets.require(id).await?;
    let instances = state.sheets.list_instances(Some(id)).await?;
    Ok(Json(InstanceListResponse { instances }))
}

/// GET /api/sheet-instances
async fn list_all_instances(State(state): State<SheetState>) -> ApiResult<InstanceListResponse> {
    let instances = state.sheets.list_instances(None).await?;
    Ok(Json(InstanceListResponse { instances }))
}

/// POST /api/sheet-instances
async fn create_instance(
    State(state): State<SheetState>,
    Json(req): Json<InstanceRequest>,
) -> ApiResult<InstanceCreatedResponse> {
    info!(
        "Creating instance of sheet {} (herd: {:?}, breeding year: {:?})",
        req.sheet_id, req.herd_name, req.breeding_year
    );
    let instance_id = state.assembler.create_instance(&req).await?;
    Ok(Json(InstanceCreatedResponse {
        success: true,
        instance_id,
    }))
}

/// GET /api/sheet-instances/:id
async fn load_instance(
    State(state): State<SheetState>,
    path: IdPath,
) -> ApiResult<LoadedInstance> {
    let id = path_id(path)?;
    Ok(Json(state.assembler.load_instance(id).await?))
}

/// PUT /api/sheet-instances/:id/cells
async fn update_instance_cell(
    State(state): State<SheetState>,
    path: IdPath,
    Json(update): Json<CellUpdate>,
) -> ApiResult<SuccessResponse> {
    let id = path_id(path)?;
    state.assembler.update_instance_cell(id, &update).await?;
    Ok(Json(SuccessResponse::ok()))
}

/// Create router for sheet endpoints
pub fn create_sheet_router(state: SheetState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/sheets", get(list_sheets).post(create_sheet))
        .route("/api/sheets/available-columns", get(available_columns))
        .route("/api/sheets/load", post(load_sheet))
        .route(
            "/api/sheets/:id",
            get(get_sheet).put(update_sheet).delete(delete_sheet),
        )
        .route("/api/sheets/:id/instances", get(list_sheet_instances))
        .route(
            "/api/sheet-instances",
            get(list_all_instances).post(create_instance),
        )
        .route("/api/sheet-instances/:id", get(load_instance))
        .route("/api/sheet-instances/:id/cells", put(update_instance_cell))
        .with_state(state)
}
