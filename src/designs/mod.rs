// SPDX-License-Identifier: MIT

//! User design records.
//!
//! A design is the saved output of an AI generation the client ran: the
//! prompt and the URL of the rendered image. The generation call and the
//! image hosting are out of scope — only the record is.

use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::storage::{now_rfc3339, with_timeout};

#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct DesignRow {
    pub id: String,
    pub user_id: String,
    pub prompt: String,
    pub image_url: String,
    pub is_public: bool,
    pub created_at: String,
}

#[derive(Clone)]
pub struct DesignStorage {
    pool: SqlitePool,
}

impl DesignStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_design(
        &self,
        user_id: &str,
        prompt: &str,
        image_url: &str,
        is_public: bool,
    ) -> Result<DesignRow> {
        let id = Uuid::new_v4().to_string();
        let now = now_rfc3339();
        sqlx::query(
            "INSERT INTO designs (id, user_id, prompt, image_url, is_public, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(user_id)
        .bind(prompt)
        .bind(image_url)
        .bind(is_public)
        .bind(&now)
        .execute(&self.pool)
        .await?;
        Ok(DesignRow {
            id,
            user_id: user_id.to_string(),
            prompt: prompt.to_string(),
            image_url: image_url.to_string(),
            is_public,
            created_at: now,
        })
    }

    pub async fn list_user_designs(
        &self,
        user_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<DesignRow>, i64)> {
        let rows = with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT * FROM designs WHERE user_id = ?
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
        })
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM designs WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok((rows, total.0))
    }

    /// Public gallery: everyone's `is_public` designs, newest first.
    pub async fn list_public_designs(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<DesignRow>, i64)> {
        let rows = with_timeout(async {
            Ok(sqlx::query_as(
                "SELECT * FROM designs WHERE is_public = 1
                 ORDER BY created_at DESC LIMIT ? OFFSET ?",
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?)
        })
        .await?;
        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM designs WHERE is_public = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok((rows, total.0))
    }

    /// Delete a design the user owns. Returns `false` when it does not exist
    /// or belongs to someone else.
    pub async fn delete_design(&self, id: &str, user_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM designs WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
