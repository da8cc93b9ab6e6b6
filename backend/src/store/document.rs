//! Secondary document store
//!
//! A single JSONB table partitioned by collection name. It holds mirrors of
//! store/transfer orders (tagged with `postgres_id`) and the legacy vendor
//! records that predate the relational vendors table.

use async_trait::async_trait;
use serde::Serialize;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use super::DocumentStore;
use crate::error::AppResult;

#[derive(Clone)]
pub struct PgDocumentStore {
    db: PgPool,
}

impl PgDocumentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn put(&self, collection: &str, id: &str, document: serde_json::Value) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body, updated_at = NOW()
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Json(document))
        .execute(&self.db)
        .await?;

        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> AppResult<Option<serde_json::Value>> {
        let body = sqlx::query_scalar::<_, Json<serde_json::Value>>(
            "SELECT body FROM documents WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(body.map(|Json(value)| value))
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Serialize a primary record as its mirror document.
///
/// The mirror carries `postgres_id` so readers of the document store can
/// find the source-of-truth row.
pub fn mirror_document<T: Serialize>(primary_id: Uuid, record: &T) -> AppResult<serde_json::Value> {
    let mut value = serde_json::to_value(record)?;
    if let serde_json::Value::Object(map) = &mut value {
        map.insert(
            "postgres_id".to_string(),
            serde_json::Value::String(primary_id.to_string()),
        );
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize)]
    struct Probe {
        name: &'static str,
    }

    #[test]
    fn test_mirror_document_carries_cross_reference() {
        let id = Uuid::new_v4();
        let doc = mirror_document(id, &Probe { name: "SO-00001" }).unwrap();
        assert_eq!(doc["postgres_id"], id.to_string());
        assert_eq!(doc["name"], "SO-00001");
    }
}
