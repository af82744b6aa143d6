use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::PgStore;
use crate::database::models::{Comment, NewComment, ParentSnapshot};
use crate::database::query_builder::{select_all, select_optional};
use crate::database::store::{CommentRepo, StoreResult};
use crate::database::DatabaseError;
use crate::filter::{comment_select, CommentFilter};

#[derive(Debug, FromRow)]
struct CommentRow {
    id: String,
    body: String,
    author: String,
    post_id: String,
    status: String,
    parent_id: Option<String>,
    parent_author: Option<String>,
    parent_body: Option<String>,
    likes: i64,
    dislikes: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    user_vote: Option<String>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = DatabaseError;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        let parent_comment = row.parent_id.map(|id| ParentSnapshot {
            id,
            author: row.parent_author.unwrap_or_default(),
            body: row.parent_body.unwrap_or_default(),
        });

        Ok(Comment {
            id: row.id,
            body: row.body,
            author: row.author,
            post_id: row.post_id,
            parent_comment,
            status: row.status.parse()?,
            likes: row.likes,
            dislikes: row.dislikes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user_vote: row.user_vote.map(|v| v.parse()).transpose()?,
        })
    }
}

#[async_trait]
impl CommentRepo for PgStore {
    async fn create_comment(&self, comment: NewComment) -> StoreResult<()> {
        let (parent_id, parent_author, parent_body) = match comment.parent {
            Some(parent) => (Some(parent.id), Some(parent.author), Some(parent.body)),
            None => (None, None, None),
        };

        sqlx::query(
            "INSERT INTO comment (id, body, author, post_id, status, parent_id, parent_author, parent_body) \
             VALUES ($1, $2, $3, $4, 'Published', $5, $6, $7)",
        )
        .bind(&comment.id)
        .bind(&comment.body)
        .bind(&comment.author)
        .bind(&comment.post_id)
        .bind(parent_id)
        .bind(parent_author)
        .bind(parent_body)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_comments(&self, filter: &CommentFilter) -> StoreResult<Vec<Comment>> {
        let rows: Vec<CommentRow> = select_all(&self.pool, &comment_select(filter)).await?;
        rows.into_iter().map(Comment::try_from).collect()
    }

    async fn get_comment(&self, viewer: &str, id: &str) -> StoreResult<Option<Comment>> {
        let filter = CommentFilter::new(viewer).id(id);
        let row: Option<CommentRow> = select_optional(&self.pool, &comment_select(&filter)).await?;
        row.map(Comment::try_from).transpose()
    }

    async fn update_comment(&self, id: &str, body: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE comment SET body = $1, updated_at = NOW() WHERE id = $2 AND status <> 'Deleted'",
        )
        .bind(body)
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }

    async fn soft_delete_comment(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE comment SET body = '', status = 'Deleted', updated_at = NOW() \
             WHERE id = $1 AND status <> 'Deleted'",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }
        Ok(())
    }
}
