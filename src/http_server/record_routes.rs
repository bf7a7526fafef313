//! Record HTTP Routes
//!
//! The same six routes serve every record collection (`/policies`,
//! `/applications`), generic over the attribute set. All of them require a
//! bearer token.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Response,
    routing::{get, put},
    Extension, Router,
};
use uuid::Uuid;

use super::errors::ApiError;
use super::extract::ApiJson;
use super::middleware::require_bearer;
use super::response::ApiResponse;
use crate::auth::{AuthService, JwtClaims};
use crate::record::{
    CreateRecord, FieldsUpdate, RecordAttributes, RecordService, SchemaUpdate, UpdateRecord,
};

/// Routes for one record collection, guarded by `require_bearer`
pub fn record_routes<A: RecordAttributes>(
    service: Arc<RecordService<A>>,
    auth: Arc<AuthService>,
) -> Router {
    Router::new()
        .route("/", get(list_handler::<A>).post(create_handler::<A>))
        .route(
            "/:id",
            get(get_handler::<A>)
                .put(update_handler::<A>)
                .delete(delete_handler::<A>),
        )
        .route("/:id/schema", put(update_schema_handler::<A>))
        .route("/:id/fields", put(update_fields_handler::<A>))
        .with_state(service)
        .route_layer(middleware::from_fn_with_state(auth, require_bearer))
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::BadRequest(format!("Invalid id '{}'", raw)))
}

async fn create_handler<A: RecordAttributes>(
    State(service): State<Arc<RecordService<A>>>,
    Extension(claims): Extension<JwtClaims>,
    ApiJson(req): ApiJson<CreateRecord<A::Input>>,
) -> Result<Response, ApiError> {
    let record = service.create(req, &claims.sub)?;
    Ok(ApiResponse::created(format!("{} created successfully", A::LABEL), record))
}

async fn list_handler<A: RecordAttributes>(
    State(service): State<Arc<RecordService<A>>>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    let page = service.list_params(&params)?;
    Ok(ApiResponse::ok(format!("{} list fetched successfully", A::LABEL), page))
}

async fn get_handler<A: RecordAttributes>(
    State(service): State<Arc<RecordService<A>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let record = service.get(parse_id(&id)?)?;
    Ok(ApiResponse::ok(format!("{} fetched successfully", A::LABEL), record))
}

async fn update_handler<A: RecordAttributes>(
    State(service): State<Arc<RecordService<A>>>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<UpdateRecord<A::Patch>>,
) -> Result<Response, ApiError> {
    let record = service.update(parse_id(&id)?, patch)?;
    Ok(ApiResponse::ok(format!("{} updated successfully", A::LABEL), record))
}

async fn delete_handler<A: RecordAttributes>(
    State(service): State<Arc<RecordService<A>>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    service.delete(id)?;
    Ok(ApiResponse::ok(
        format!("{} deleted successfully", A::LABEL),
        serde_json::json!({ "id": id }),
    ))
}

async fn update_schema_handler<A: RecordAttributes>(
    State(service): State<Arc<RecordService<A>>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<SchemaUpdate>,
) -> Result<Response, ApiError> {
    let record = service.update_schema(parse_id(&id)?, body.schema_definition)?;
    Ok(ApiResponse::ok("Schema updated successfully", record))
}

async fn update_fields_handler<A: RecordAttributes>(
    State(service): State<Arc<RecordService<A>>>,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<FieldsUpdate>,
) -> Result<Response, ApiError> {
    let record = service.update_dynamic_fields(parse_id(&id)?, body.dynamic_fields)?;
    Ok(ApiResponse::ok("Dynamic fields updated successfully", record))
}
