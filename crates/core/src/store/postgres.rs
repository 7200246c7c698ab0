use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use super::ContentStore;
use crate::document::model::DocumentRow;
use crate::document::{Document, ItemType};
use crate::error::{CoreError, Result};
use crate::recycle_bin::model::{
    BinFilter, BinStats, DeletedItem, DeletedItemRow, DeletionStamp, PageRequest, PurgeFilter,
    TypeStats,
};

const DOCUMENT_COLUMNS: &str = "id, kind, slug, fields, created_at, updated_at";
const DELETED_COLUMNS: &str =
    "id, item_type, original_id, snapshot, title, slug, deleted_by, deleted_at, expires_at";

/// PostgreSQL-backed store. Documents keep their content in a JSONB column.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn page_bounds(page: PageRequest) -> (i64, i64) {
    (page.limit() as i64, page.offset() as i64)
}

#[async_trait]
impl ContentStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn get_document(&self, kind: ItemType, id: Uuid) -> Result<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = $1 AND kind = $2"
        ))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Document::try_from).transpose()
    }

    async fn list_documents(&self, kind: ItemType, page: PageRequest) -> Result<Vec<Document>> {
        let (limit, offset) = page_bounds(page);
        let rows: Vec<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE kind = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        ))
        .bind(kind.as_str())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Document::try_from).collect()
    }

    async fn count_documents(&self, kind: ItemType) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM documents WHERE kind = $1")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn insert_document(&self, doc: &Document) -> Result<()> {
        insert_document(&self.pool, doc).await
    }

    async fn update_document(&self, doc: &Document) -> Result<()> {
        let result = sqlx::query(
            "UPDATE documents SET slug = $3, fields = $4, updated_at = $5 \
             WHERE id = $1 AND kind = $2",
        )
        .bind(doc.id)
        .bind(doc.kind.as_str())
        .bind(&doc.slug)
        .bind(Json(&doc.fields))
        .bind(doc.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found(doc.kind, doc.id));
        }
        Ok(())
    }

    async fn flag_holder(&self, kind: ItemType, flag: &str) -> Result<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE kind = $1 AND fields -> $2::text = 'true'::jsonb \
             ORDER BY updated_at DESC, id DESC LIMIT 1"
        ))
        .bind(kind.as_str())
        .bind(flag)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Document::try_from).transpose()
    }

    async fn clear_flag(
        &self,
        kind: ItemType,
        flag: &str,
        keep: Uuid,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE documents \
             SET fields = jsonb_set(fields, ARRAY[$2::text], 'false'::jsonb), updated_at = $4 \
             WHERE kind = $1 AND id <> $3 AND fields -> $2::text = 'true'::jsonb",
        )
        .bind(kind.as_str())
        .bind(flag)
        .bind(keep)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn move_to_bin(
        &self,
        kind: ItemType,
        id: Uuid,
        stamp: &DeletionStamp,
    ) -> Result<Option<DeletedItem>> {
        let mut tx = self.pool.begin().await?;

        // The row lock taken by DELETE makes a concurrent second delete see nothing.
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "DELETE FROM documents WHERE id = $1 AND kind = $2 RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let doc = Document::try_from(row)?;
        let item = DeletedItem::capture(&doc, stamp)?;

        sqlx::query(&format!(
            "INSERT INTO deleted_items ({DELETED_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(item.id)
        .bind(item.item_type.as_str())
        .bind(item.original_id)
        .bind(&item.snapshot)
        .bind(&item.title)
        .bind(&item.slug)
        .bind(item.deleted_by)
        .bind(item.deleted_at)
        .bind(item.expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(item))
    }

    async fn get_deleted(&self, id: Uuid) -> Result<Option<DeletedItem>> {
        let row: Option<DeletedItemRow> = sqlx::query_as(&format!(
            "SELECT {DELETED_COLUMNS} FROM deleted_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(DeletedItem::try_from).transpose()
    }

    async fn list_deleted(&self, filter: &BinFilter, page: PageRequest) -> Result<Vec<DeletedItem>> {
        let (limit, offset) = page_bounds(page);
        let rows: Vec<DeletedItemRow> = sqlx::query_as(&format!(
            "SELECT {DELETED_COLUMNS} FROM deleted_items \
             WHERE ($1::text IS NULL OR item_type = $1) \
               AND ($2::uuid IS NULL OR deleted_by = $2) \
             ORDER BY deleted_at DESC, id DESC LIMIT $3 OFFSET $4"
        ))
        .bind(filter.item_type.map(|t| t.as_str()))
        .bind(filter.deleted_by)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(DeletedItem::try_from).collect()
    }

    async fn count_deleted(&self, filter: &BinFilter) -> Result<u64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM deleted_items \
             WHERE ($1::text IS NULL OR item_type = $1) \
               AND ($2::uuid IS NULL OR deleted_by = $2)",
        )
        .bind(filter.item_type.map(|t| t.as_str()))
        .bind(filter.deleted_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn restore_from_bin(&self, deleted_id: Uuid, doc: &Document) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let claimed: Option<(Uuid,)> =
            sqlx::query_as("DELETE FROM deleted_items WHERE id = $1 RETURNING id")
                .bind(deleted_id)
                .fetch_optional(&mut *tx)
                .await?;
        if claimed.is_none() {
            tx.rollback().await?;
            return Ok(false);
        }

        // Dropping `tx` on error rolls the claim back, so a conflict keeps the record.
        insert_document(&mut *tx, doc).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn remove_deleted(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM deleted_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_deleted(&self, filter: &PurgeFilter) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM deleted_items \
             WHERE ($1::text IS NULL OR item_type = $1) \
               AND ($2::timestamptz IS NULL OR expires_at <= $2)",
        )
        .bind(filter.item_type.map(|t| t.as_str()))
        .bind(filter.expired_before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn bin_stats(&self, expiring_before: DateTime<Utc>) -> Result<BinStats> {
        let (total, expiring_soon): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE expires_at <= $1) FROM deleted_items",
        )
        .bind(expiring_before)
        .fetch_one(&self.pool)
        .await?;

        let rows: Vec<(String, i64, DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
            "SELECT item_type, COUNT(*), MIN(deleted_at), MAX(deleted_at) \
             FROM deleted_items GROUP BY item_type ORDER BY item_type",
        )
        .fetch_all(&self.pool)
        .await?;

        let by_type = rows
            .into_iter()
            .map(|(item_type, count, oldest, newest)| {
                Ok(TypeStats {
                    item_type: item_type.parse()?,
                    count: count as u64,
                    oldest_deleted_at: oldest,
                    newest_deleted_at: newest,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BinStats {
            total: total as u64,
            expiring_soon: expiring_soon as u64,
            by_type,
        })
    }
}

async fn insert_document<'e, E>(executor: E, doc: &Document) -> Result<()>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query(&format!(
        "INSERT INTO documents ({DOCUMENT_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6)"
    ))
    .bind(doc.id)
    .bind(doc.kind.as_str())
    .bind(&doc.slug)
    .bind(Json(&doc.fields))
    .bind(doc.created_at)
    .bind(doc.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

// Run against a scratch PostgreSQL server:
// DATABASE_URL=postgres://... cargo test -p newsdesk-core -- --ignored
#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::NewDocument;
    use crate::recycle_bin::model::RetentionPolicy;
    use chrono::{Duration, TimeZone};
    use serde_json::{json, Value};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
    }

    fn doc(kind: ItemType, fields: Value) -> Document {
        NewDocument::new(kind, fields.as_object().cloned().unwrap())
            .into_document(t0())
            .unwrap()
    }

    async fn binned(store: &PgStore, doc: &Document, at: DateTime<Utc>) -> Result<DeletedItem> {
        store.insert_document(doc).await?;
        let stamp = RetentionPolicy::default().stamp(Uuid::new_v4(), at)?;
        Ok(store.move_to_bin(doc.kind, doc.id, &stamp).await?.unwrap())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn move_to_bin_swaps_document_for_snapshot(pool: PgPool) -> Result<()> {
        let store = PgStore::new(pool);
        let article = doc(ItemType::Article, json!({"title": "Budget 2024", "status": "published"}));

        let item = binned(&store, &article, t0()).await?;
        assert_eq!(item.original_id, article.id);
        assert_eq!(item.title, "Budget 2024");
        assert!(store.get_document(ItemType::Article, article.id).await?.is_none());

        let stored = store.get_deleted(item.id).await?.unwrap();
        assert_eq!(stored.snapshot, item.snapshot);
        assert_eq!(stored.expires_at, t0() + Duration::days(30));

        let stamp = RetentionPolicy::default().stamp(Uuid::new_v4(), t0())?;
        assert!(store.move_to_bin(ItemType::Article, article.id, &stamp).await?.is_none());
        assert_eq!(store.count_deleted(&BinFilter::default()).await?, 1);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn duplicate_slug_is_conflict(pool: PgPool) -> Result<()> {
        let store = PgStore::new(pool);
        store.insert_document(&doc(ItemType::Category, json!({"name": "Sports"}))).await?;
        store.insert_document(&doc(ItemType::Tag, json!({"name": "Sports"}))).await?;

        let err = store
            .insert_document(&doc(ItemType::Category, json!({"name": "Sports"})))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn restore_conflict_rolls_back_the_claim(pool: PgPool) -> Result<()> {
        let store = PgStore::new(pool);
        let sports = doc(ItemType::Category, json!({"name": "Sports"}));
        let item = binned(&store, &sports, t0()).await?;
        store.insert_document(&doc(ItemType::Category, json!({"name": "Sports"}))).await?;

        let err = store.restore_from_bin(item.id, &sports).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
        assert!(store.get_deleted(item.id).await?.is_some());
        assert!(store.get_document(ItemType::Category, sports.id).await?.is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn concurrent_restores_have_one_winner(pool: PgPool) -> Result<()> {
        let store = PgStore::new(pool);
        let tag = doc(ItemType::Tag, json!({"name": "economy"}));
        let item = binned(&store, &tag, t0()).await?;

        let (a, b) = tokio::join!(
            store.restore_from_bin(item.id, &tag),
            store.restore_from_bin(item.id, &tag),
        );
        let mut outcomes = vec![a?, b?];
        outcomes.sort();
        assert_eq!(outcomes, vec![false, true]);
        assert!(store.get_document(ItemType::Tag, tag.id).await?.is_some());
        assert!(store.get_deleted(item.id).await?.is_none());
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn filters_and_purge_counts(pool: PgPool) -> Result<()> {
        let store = PgStore::new(pool);
        let old = binned(&store, &doc(ItemType::Tag, json!({"name": "old"})), t0()).await?;
        let later = t0() + Duration::days(20);
        binned(&store, &doc(ItemType::Tag, json!({"name": "fresh"})), later).await?;
        binned(&store, &doc(ItemType::Author, json!({"name": "Jane Roe"})), later).await?;

        let tags = BinFilter {
            item_type: Some(ItemType::Tag),
            ..BinFilter::default()
        };
        assert_eq!(store.count_deleted(&tags).await?, 2);
        assert_eq!(store.count_deleted(&BinFilter::default()).await?, 3);
        let page = store.list_deleted(&tags, PageRequest::new(1, 1)?).await?;
        assert_eq!(page.len(), 1);
        assert_ne!(page[0].id, old.id, "newest deletion first");

        let stats = store.bin_stats(old.expires_at).await?;
        assert_eq!(stats.total, 3);
        assert_eq!(stats.expiring_soon, 1);
        assert_eq!(stats.by_type.len(), 2);

        let expired = PurgeFilter {
            item_type: None,
            expired_before: Some(old.expires_at),
        };
        assert_eq!(store.purge_deleted(&expired).await?, 1);
        let authors = PurgeFilter {
            item_type: Some(ItemType::Author),
            expired_before: None,
        };
        assert_eq!(store.purge_deleted(&authors).await?, 1);
        assert_eq!(store.purge_deleted(&PurgeFilter::default()).await?, 1);
        assert_eq!(store.count_deleted(&BinFilter::default()).await?, 0);
        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    #[ignore = "needs DATABASE_URL"]
    async fn clear_flag_leaves_one_holder(pool: PgPool) -> Result<()> {
        let store = PgStore::new(pool);
        let storm = doc(ItemType::BreakingNews, json!({"title": "Storm", "isActive": true}));
        let flood = doc(ItemType::BreakingNews, json!({"title": "Flood", "isActive": true}));
        store.insert_document(&storm).await?;
        store.insert_document(&flood).await?;

        let later = t0() + Duration::hours(1);
        assert_eq!(store.clear_flag(ItemType::BreakingNews, "isActive", flood.id, later).await?, 1);

        let holder = store.flag_holder(ItemType::BreakingNews, "isActive").await?.unwrap();
        assert_eq!(holder.id, flood.id);
        let storm = store.get_document(ItemType::BreakingNews, storm.id).await?.unwrap();
        assert_eq!(storm.fields["isActive"], Value::Bool(false));
        assert_eq!(storm.updated_at, later);
        Ok(())
    }
}
