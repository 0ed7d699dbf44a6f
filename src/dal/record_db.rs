use std::collections::HashSet;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

use crate::{
    domain::{EnrichmentResult, SourceRecord, StoreError, ViewPreview},
    services::RecordStore,
};

pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        PgRecordStore { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn table_fields(&self, table_id: &str) -> Result<Option<HashSet<String>>, StoreError> {
        let exists: Option<String> = sqlx::query_scalar(
            r"
            select id from base_table where id = $1
            ",
        )
        .bind(table_id)
        .fetch_optional(&self.pool)
        .await?;

        if exists.is_none() {
            return Ok(None);
        }

        let fields: Vec<String> = sqlx::query_scalar(
            r"
            select id from table_field where table_id = $1
            ",
        )
        .bind(table_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(fields.into_iter().collect()))
    }

    async fn view_preview(
        &self,
        table_id: &str,
        view_id: &str,
    ) -> Result<Option<ViewPreview>, StoreError> {
        let row: Option<(String, String, i64)> = sqlx::query_as(
            r"
            select
                t.name,
                v.name,
                (
                    select count(*)
                    from view_record vr join record r on r.id = vr.record_id
                    where vr.view_id = v.id and r.table_id = t.id
                )
            from
                base_view v
                join base_table t on t.id = v.table_id
            where
                v.id = $1 and
                t.id = $2
            ",
        )
        .bind(view_id)
        .bind(table_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(table_name, view_name, count)| ViewPreview {
            table_name,
            view_name,
            record_count: count.max(0) as usize,
        }))
    }

    async fn load_source_records(
        &self,
        table_id: &str,
        view_id: &str,
        source_field_id: &str,
    ) -> Result<Option<Vec<SourceRecord>>, StoreError> {
        let view: Option<String> = sqlx::query_scalar(
            r"
            select id from base_view where id = $1 and table_id = $2
            ",
        )
        .bind(view_id)
        .bind(table_id)
        .fetch_optional(&self.pool)
        .await?;

        if view.is_none() {
            return Ok(None);
        }

        // Only the source cell is read; output fields are write-only here.
        let rows: Vec<(String, Option<Value>)> = sqlx::query_as(
            r"
            select
                r.id,
                r.fields -> $3::text
            from
                view_record vr
                join record r on r.id = vr.record_id
            where
                vr.view_id = $1 and
                r.table_id = $2
            order by
                vr.position, r.id
            ",
        )
        .bind(view_id)
        .bind(table_id)
        .bind(source_field_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(
            rows.into_iter()
                .map(|(id, value)| SourceRecord::new(id, cell_as_string(value)))
                .collect(),
        ))
    }

    async fn update_records(
        &self,
        table_id: &str,
        updates: &[EnrichmentResult],
    ) -> Result<(), StoreError> {
        let (ids, fields): (Vec<String>, Vec<Value>) = updates
            .iter()
            .map(|u| {
                let fields = u
                    .fields
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                (u.record_id.clone(), Value::Object(fields))
            })
            .unzip();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            update record r set
                fields = r.fields || u.fields
            from
                unnest($1::text[], $2::jsonb[]) as u(id, fields)
            where
                r.id = u.id and
                r.table_id = $3
            ",
        )
        .bind(&ids)
        .bind(&fields)
        .bind(table_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() != updates.len() as u64 {
            tx.rollback().await?;
            return Err(StoreError::Rejected {
                expected: updates.len(),
                affected: result.rows_affected(),
            });
        }

        tx.commit().await?;
        Ok(())
    }
}

fn cell_as_string(value: Option<Value>) -> String {
    match value {
        Some(Value::String(s)) => s,
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
