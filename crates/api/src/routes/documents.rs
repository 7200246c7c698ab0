//! CRUD over the live collections. Deletion is always a soft delete.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::{ApiJson, ApiPath, ApiQuery, PageQuery};
use crate::auth::{AdminUser, AuthUser};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use newsdesk_core::document::{Document, DocumentPatch, ItemType, NewDocument};
use newsdesk_core::events::ContentEvent;
use newsdesk_core::recycle_bin::{Page, Pagination};
use newsdesk_core::store::exclusive;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/breaking-news/active", get(active_breaking_news))
        .route("/v1/{collection}", get(list_documents).post(create_document))
        .route(
            "/v1/{collection}/{id}",
            get(get_document).patch(update_document).delete(delete_document),
        )
}

fn collection_kind(collection: &str) -> ApiResult<ItemType> {
    ItemType::from_collection(collection)
        .ok_or_else(|| ApiError::NotFound(format!("unknown collection '{collection}'")))
}

async fn list_documents(
    State(state): State<AppState>,
    WithRejection(Path(collection), _): ApiPath<String>,
    WithRejection(Query(query), _): ApiQuery<PageQuery>,
) -> ApiResult<Json<Page<Document>>> {
    let kind = collection_kind(&collection)?;
    let page = query.to_request()?;
    let items = state.store().list_documents(kind, page).await?;
    let total = state.store().count_documents(kind).await?;
    Ok(Json(Page {
        items,
        pagination: Pagination::new(page, total),
    }))
}

async fn get_document(
    State(state): State<AppState>,
    WithRejection(Path((collection, id)), _): ApiPath<(String, Uuid)>,
) -> ApiResult<Json<Document>> {
    let kind = collection_kind(&collection)?;
    let doc = state
        .store()
        .get_document(kind, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{kind} {id} not found")))?;
    Ok(Json(doc))
}

/// The single breaking news item currently shown, if any.
async fn active_breaking_news(State(state): State<AppState>) -> ApiResult<Json<Option<Document>>> {
    Ok(Json(exclusive::holder(state.store(), ItemType::BreakingNews).await?))
}

async fn create_document(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path(collection), _): ApiPath<String>,
    WithRejection(Json(fields), _): ApiJson<Map<String, Value>>,
) -> ApiResult<(StatusCode, Json<Document>)> {
    let kind = collection_kind(&collection)?;
    let doc = NewDocument::new(kind, fields)
        .into_document(state.clock().now())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state.store().insert_document(&doc).await?;
    exclusive::claim(state.store(), &doc, doc.updated_at).await?;

    tracing::info!(item_type = %kind, id = %doc.id, user = %user.id, "document created");
    state.event_bus().emit(ContentEvent::Created {
        item_type: kind,
        id: doc.id,
        timestamp: doc.created_at,
    });
    Ok((StatusCode::CREATED, Json(doc)))
}

async fn update_document(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Path((collection, id)), _): ApiPath<(String, Uuid)>,
    WithRejection(Json(patch), _): ApiJson<DocumentPatch>,
) -> ApiResult<Json<Document>> {
    let kind = collection_kind(&collection)?;
    let mut doc = state
        .store()
        .get_document(kind, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{kind} {id} not found")))?;

    patch
        .apply(&mut doc, state.clock().now())
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    state.store().update_document(&doc).await?;
    exclusive::claim(state.store(), &doc, doc.updated_at).await?;

    tracing::info!(item_type = %kind, %id, user = %user.id, "document updated");
    state.event_bus().emit(ContentEvent::Updated {
        item_type: kind,
        id,
        timestamp: doc.updated_at,
    });
    Ok(Json(doc))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SoftDeleteResponse {
    deleted_item_id: Uuid,
    item_type: ItemType,
    original_id: Uuid,
    expires_at: DateTime<Utc>,
}

async fn delete_document(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    WithRejection(Path((collection, id)), _): ApiPath<(String, Uuid)>,
) -> ApiResult<Json<SoftDeleteResponse>> {
    let kind = collection_kind(&collection)?;
    let item = state.dispatcher().soft_delete(kind, id, admin.id).await?;
    Ok(Json(SoftDeleteResponse {
        deleted_item_id: item.id,
        item_type: item.item_type,
        original_id: item.original_id,
        expires_at: item.expires_at,
    }))
}
