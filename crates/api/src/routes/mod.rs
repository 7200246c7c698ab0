pub mod documents;
pub mod health;
pub mod recycle_bin;

use axum::{
    extract::{Path, Query},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use crate::error::ApiError;
use crate::state::AppState;
use newsdesk_core::document::ItemType;
use newsdesk_core::recycle_bin::PageRequest;

/// Assemble the full router with all route groups.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(recycle_bin::routes())
        .merge(documents::routes())
        .with_state(state)
}

/// Extractors whose rejections use the JSON error envelope.
pub type ApiQuery<T> = WithRejection<Query<T>, ApiError>;
pub type ApiPath<T> = WithRejection<Path<T>, ApiError>;
pub type ApiJson<T> = WithRejection<Json<T>, ApiError>;

/// `?page=&limit=` query shared by the listing endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    pub fn to_request(&self) -> Result<PageRequest, ApiError> {
        Ok(PageRequest::new(
            self.page.unwrap_or(1),
            self.limit.unwrap_or(PageRequest::DEFAULT_SIZE),
        )?)
    }
}

/// Parse a client-supplied type tag. Unlike a bad tag found in stored data,
/// this is a caller mistake.
pub fn parse_item_type(raw: &str) -> Result<ItemType, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown item type '{raw}'")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::build_router;
    use crate::auth::{testing::token, Role};
    use crate::config::AppConfig;
    use crate::state::AppState;
    use newsdesk_core::events::EventBus;
    use newsdesk_core::recycle_bin::RetentionPolicy;
    use newsdesk_core::store::MemoryStore;

    struct TestApp {
        router: Router,
        admin: String,
        editor: String,
    }

    impl TestApp {
        fn new() -> Self {
            let config = AppConfig::for_tests();
            let admin = token(Uuid::new_v4(), Role::Admin, &config.jwt_secret);
            let editor = token(Uuid::new_v4(), Role::Editor, &config.jwt_secret);
            let state = AppState::new(
                Arc::new(MemoryStore::new()),
                config,
                EventBus::new(16),
                RetentionPolicy::default(),
            );
            Self {
                router: build_router(state),
                admin,
                editor,
            }
        }

        async fn call(
            &self,
            method: Method,
            uri: &str,
            token: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut req = Request::builder().method(method).uri(uri);
            if let Some(token) = token {
                req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
            }
            let req = match body {
                Some(body) => req
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => req.body(Body::empty()).unwrap(),
            };

            let res = self.router.clone().oneshot(req).await.unwrap();
            let status = res.status();
            let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap_or(Value::Null)
            };
            (status, value)
        }

        async fn create(&self, collection: &str, body: Value) -> Value {
            let (status, doc) = self
                .call(Method::POST, &format!("/v1/{collection}"), Some(&self.editor), Some(body))
                .await;
            assert_eq!(status, StatusCode::CREATED, "{doc}");
            doc
        }

        async fn soft_delete(&self, collection: &str, id: &str) -> Value {
            let (status, body) = self
                .call(Method::DELETE, &format!("/v1/{collection}/{id}"), Some(&self.admin), None)
                .await;
            assert_eq!(status, StatusCode::OK, "{body}");
            body
        }
    }

    #[tokio::test]
    async fn ping_and_health() {
        let app = TestApp::new();
        let (status, body) = app.call(Method::GET, "/v1/ping", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");

        let (status, body) = app.call(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["store"], "connected");
    }

    #[tokio::test]
    async fn delete_restore_round_trip() {
        let app = TestApp::new();
        let article = app
            .create("articles", json!({"title": "Budget 2024", "body": "Numbers"}))
            .await;
        let id = article["id"].as_str().unwrap();

        let deleted = app.soft_delete("articles", id).await;
        assert_eq!(deleted["itemType"], "article");
        assert_eq!(deleted["originalId"], id);
        let bin_id = deleted["deletedItemId"].as_str().unwrap().to_string();

        let (status, _) = app.call(Method::GET, &format!("/v1/articles/{id}"), None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, listing) = app
            .call(Method::GET, "/v1/recycle-bin?itemType=article", Some(&app.admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listing["items"][0]["id"], bin_id.as_str());
        assert_eq!(listing["items"][0]["title"], "Budget 2024");
        assert_eq!(listing["pagination"]["totalItems"], 1);

        let restore_uri = format!("/v1/recycle-bin/{bin_id}/restore");
        let (status, restored) = app.call(Method::POST, &restore_uri, Some(&app.admin), None).await;
        assert_eq!(status, StatusCode::OK, "{restored}");
        assert_eq!(restored["restoredItem"]["id"], id);
        assert_eq!(restored["restoredItem"]["body"], "Numbers");
        assert_eq!(restored["restoredItem"]["createdAt"], article["createdAt"]);

        let (status, again) = app.call(Method::POST, &restore_uri, Some(&app.admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(again["error"]["type"], "notFound");

        let (status, _) = app.call(Method::GET, &format!("/v1/articles/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_requires_admin() {
        let app = TestApp::new();
        let tag = app.create("tags", json!({"name": "economy"})).await;
        let uri = format!("/v1/tags/{}", tag["id"].as_str().unwrap());

        let (status, _) = app.call(Method::DELETE, &uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = app.call(Method::DELETE, &uri, Some(&app.editor), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["type"], "forbidden");

        let (status, _) = app.call(Method::GET, "/v1/recycle-bin", Some(&app.editor), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn restore_conflict_keeps_item() {
        let app = TestApp::new();
        let sports = app.create("categories", json!({"name": "Sports"})).await;
        let deleted = app
            .soft_delete("categories", sports["id"].as_str().unwrap())
            .await;
        let bin_id = deleted["deletedItemId"].as_str().unwrap();

        app.create("categories", json!({"name": "Sports"})).await;
        let (status, dup) = app
            .call(Method::POST, "/v1/categories", Some(&app.editor), Some(json!({"name": "Sports"})))
            .await;
        assert_eq!(status, StatusCode::CONFLICT, "{dup}");

        let (status, body) = app
            .call(
                Method::POST,
                &format!("/v1/recycle-bin/{bin_id}/restore"),
                Some(&app.admin),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["type"], "conflict");

        let (status, item) = app
            .call(Method::GET, &format!("/v1/recycle-bin/{bin_id}"), Some(&app.admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(item["itemType"], "category");
    }

    #[tokio::test]
    async fn empty_by_type_reports_count() {
        let app = TestApp::new();
        for name in ["one", "two"] {
            let tag = app.create("tags", json!({ "name": name })).await;
            app.soft_delete("tags", tag["id"].as_str().unwrap()).await;
        }
        let author = app.create("authors", json!({"name": "Jane Roe"})).await;
        app.soft_delete("authors", author["id"].as_str().unwrap()).await;

        let (status, body) = app
            .call(Method::POST, "/v1/recycle-bin/empty?itemType=tag", Some(&app.admin), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["deletedCount"], 2);

        let (_, stats) = app
            .call(Method::GET, "/v1/recycle-bin/stats", Some(&app.admin), None)
            .await;
        assert_eq!(stats["total"], 1);
        assert_eq!(stats["byType"][0]["itemType"], "author");
    }

    #[tokio::test]
    async fn permanent_delete_is_not_repeatable() {
        let app = TestApp::new();
        let page = app.create("static-pages", json!({"title": "About"})).await;
        let deleted = app.soft_delete("static-pages", page["id"].as_str().unwrap()).await;
        let uri = format!("/v1/recycle-bin/{}", deleted["deletedItemId"].as_str().unwrap());

        let (status, _) = app.call(Method::DELETE, &uri, Some(&app.admin), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.call(Method::DELETE, &uri, Some(&app.admin), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn bad_inputs() {
        let app = TestApp::new();
        let (status, _) = app.call(Method::GET, "/v1/videos", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = app
            .call(Method::GET, "/v1/recycle-bin?itemType=video", Some(&app.admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "badRequest");

        let (status, _) = app
            .call(Method::GET, "/v1/recycle-bin?page=0", Some(&app.admin), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(Method::POST, "/v1/articles", Some(&app.editor), Some(json!({"body": "no title"})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = app
            .call(Method::DELETE, &format!("/v1/articles/{}", Uuid::new_v4()), Some(&app.admin), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn patch_updates_fields() {
        let app = TestApp::new();
        let news = app
            .create("breaking-news", json!({"title": "Storm", "isActive": true}))
            .await;
        let uri = format!("/v1/breaking-news/{}", news["id"].as_str().unwrap());

        let (status, body) = app
            .call(
                Method::PATCH,
                &uri,
                Some(&app.editor),
                Some(json!({"set": {"title": "Storm upgraded"}})),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["title"], "Storm upgraded");

        let (_, listing) = app.call(Method::GET, "/v1/breaking-news", None, None).await;
        assert_eq!(listing["pagination"]["totalItems"], 1);
    }

    #[tokio::test]
    async fn malformed_queries_use_the_error_envelope() {
        let app = TestApp::new();
        for uri in [
            "/v1/recycle-bin?limit=abc",
            "/v1/recycle-bin?page=-1",
            "/v1/recycle-bin/not-a-uuid",
        ] {
            let (status, body) = app.call(Method::GET, uri, Some(&app.admin), None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(body["error"]["type"], "badRequest", "{uri}");
            assert_eq!(body["error"]["statusCode"], 400, "{uri}");
        }

        let (status, body) = app.call(Method::GET, "/v1/articles?page=x", None, None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "badRequest");
    }

    #[tokio::test]
    async fn only_one_breaking_news_item_is_active() {
        let app = TestApp::new();
        let storm = app
            .create("breaking-news", json!({"title": "Storm", "isActive": true}))
            .await;
        let flood = app
            .create("breaking-news", json!({"title": "Flood", "isActive": true}))
            .await;

        let (status, active) = app.call(Method::GET, "/v1/breaking-news/active", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(active["id"], flood["id"]);

        let storm_uri = format!("/v1/breaking-news/{}", storm["id"].as_str().unwrap());
        let (_, body) = app.call(Method::GET, &storm_uri, None, None).await;
        assert_eq!(body["isActive"], false);

        let (status, _) = app
            .call(
                Method::PATCH,
                &storm_uri,
                Some(&app.editor),
                Some(json!({"set": {"isActive": true}})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, active) = app.call(Method::GET, "/v1/breaking-news/active", None, None).await;
        assert_eq!(active["id"], storm["id"]);
        let flood_uri = format!("/v1/breaking-news/{}", flood["id"].as_str().unwrap());
        let (_, body) = app.call(Method::GET, &flood_uri, None, None).await;
        assert_eq!(body["isActive"], false);
    }

    #[tokio::test]
    async fn restored_banner_stays_active_only_when_slot_is_free() {
        let app = TestApp::new();
        let storm = app
            .create("breaking-news", json!({"title": "Storm", "isActive": true}))
            .await;
        let deleted = app
            .soft_delete("breaking-news", storm["id"].as_str().unwrap())
            .await;
        let restore_uri = format!(
            "/v1/recycle-bin/{}/restore",
            deleted["deletedItemId"].as_str().unwrap()
        );

        let (status, body) = app.call(Method::POST, &restore_uri, Some(&app.admin), None).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["restoredItem"]["isActive"], true);

        let deleted = app
            .soft_delete("breaking-news", storm["id"].as_str().unwrap())
            .await;
        let flood = app
            .create("breaking-news", json!({"title": "Flood", "isActive": true}))
            .await;
        let restore_uri = format!(
            "/v1/recycle-bin/{}/restore",
            deleted["deletedItemId"].as_str().unwrap()
        );
        let (status, body) = app.call(Method::POST, &restore_uri, Some(&app.admin), None).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["restoredItem"]["isActive"], false);

        let (_, active) = app.call(Method::GET, "/v1/breaking-news/active", None, None).await;
        assert_eq!(active["id"], flood["id"]);
    }
}
