//! Administrator endpoints over the recycle bin.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::{parse_item_type, ApiPath, ApiQuery, PageQuery};
use crate::auth::AdminUser;
use crate::error::ApiResult;
use crate::state::AppState;
use newsdesk_core::recycle_bin::{BinFilter, BinStats, DeletedItem, EmptyRequest, Page};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/recycle-bin", get(list_items))
        .route("/v1/recycle-bin/stats", get(stats))
        .route("/v1/recycle-bin/empty", post(empty_bin))
        .route("/v1/recycle-bin/{id}", get(get_item).delete(permanently_delete))
        .route("/v1/recycle-bin/{id}/restore", post(restore_item))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListQuery {
    item_type: Option<String>,
    deleted_by: Option<Uuid>,
    page: Option<u32>,
    limit: Option<u32>,
}

async fn list_items(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Query(query), _): ApiQuery<ListQuery>,
) -> ApiResult<Json<Page<DeletedItem>>> {
    let filter = BinFilter {
        item_type: query.item_type.as_deref().map(parse_item_type).transpose()?,
        deleted_by: query.deleted_by,
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    }
    .to_request()?;
    Ok(Json(state.recycle_bin().list(filter, page).await?))
}

async fn stats(State(state): State<AppState>, _admin: AdminUser) -> ApiResult<Json<BinStats>> {
    Ok(Json(state.recycle_bin().stats().await?))
}

async fn get_item(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> ApiResult<Json<DeletedItem>> {
    Ok(Json(state.recycle_bin().get(id).await?))
}

async fn restore_item(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> ApiResult<Json<Value>> {
    let doc = state.recycle_bin().restore(id).await?;
    tracing::info!(deleted_item_id = %id, admin = %admin.id, "restore requested");
    Ok(Json(json!({
        "itemType": doc.kind,
        "restoredItem": doc,
    })))
}

async fn permanently_delete(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path(id), _): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    state.recycle_bin().permanently_delete(id).await?;
    tracing::info!(deleted_item_id = %id, admin = %admin.id, "permanent delete requested");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EmptyQuery {
    item_type: Option<String>,
    #[serde(default)]
    expired_only: bool,
}

async fn empty_bin(
    State(state): State<AppState>,
    _admin: AdminUser,
    WithRejection(Query(query), _): ApiQuery<EmptyQuery>,
) -> ApiResult<Json<Value>> {
    let request = EmptyRequest {
        item_type: query.item_type.as_deref().map(parse_item_type).transpose()?,
        expired_only: query.expired_only,
    };
    let deleted_count = state.recycle_bin().empty(request).await?;
    Ok(Json(json!({ "deletedCount": deleted_count })))
}
