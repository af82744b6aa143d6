use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};

use super::PgStore;
use crate::database::models::{NewPost, Post, PostChanges};
use crate::database::query_builder::{select_all, select_optional};
use crate::database::store::{PostRepo, StoreResult};
use crate::database::DatabaseError;
use crate::filter::{post_select, PostFilter};

#[derive(Debug, FromRow)]
struct PostRow {
    id: String,
    title: String,
    body: String,
    author: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    tags: Vec<String>,
    likes: i64,
    dislikes: i64,
    user_vote: Option<String>,
}

impl TryFrom<PostRow> for Post {
    type Error = DatabaseError;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Post {
            id: row.id,
            title: row.title,
            body: row.body,
            tags: row.tags,
            author: row.author,
            status: row.status.parse()?,
            likes: row.likes,
            dislikes: row.dislikes,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user_vote: row.user_vote.map(|v| v.parse()).transpose()?,
        })
    }
}

async fn insert_tags(conn: &mut PgConnection, post_id: &str, tags: &[String]) -> StoreResult<()> {
    for tag in tags {
        sqlx::query("INSERT INTO post_tag (post_id, tag) VALUES ($1, $2)")
            .bind(post_id)
            .bind(tag)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

async fn replace_tags(conn: &mut PgConnection, post_id: &str, tags: &[String]) -> StoreResult<()> {
    sqlx::query("DELETE FROM post_tag WHERE post_id = $1")
        .bind(post_id)
        .execute(&mut *conn)
        .await?;
    insert_tags(conn, post_id, tags).await
}

#[async_trait]
impl PostRepo for PgStore {
    async fn create_post(&self, post: NewPost) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO post (id, title, body, author, status) VALUES ($1, $2, $3, $4, $5)")
            .bind(&post.id)
            .bind(&post.title)
            .bind(&post.body)
            .bind(&post.author)
            .bind(post.status.as_str())
            .execute(&mut *tx)
            .await?;

        insert_tags(&mut tx, &post.id, &post.tags).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_posts(&self, filter: &PostFilter) -> StoreResult<Vec<Post>> {
        let rows: Vec<PostRow> = select_all(&self.pool, &post_select(filter)).await?;
        rows.into_iter().map(Post::try_from).collect()
    }

    async fn get_post(&self, viewer: &str, id: &str) -> StoreResult<Option<Post>> {
        let filter = PostFilter::new(viewer).id(id);
        let row: Option<PostRow> = select_optional(&self.pool, &post_select(&filter)).await?;
        row.map(Post::try_from).transpose()
    }

    async fn update_post(&self, changes: PostChanges) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE post SET title = $1, body = $2, updated_at = NOW() \
             WHERE id = $3 AND status <> 'Deleted'",
        )
        .bind(&changes.title)
        .bind(&changes.body)
        .bind(&changes.id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        replace_tags(&mut tx, &changes.id, &changes.tags).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn publish_draft(&self, changes: PostChanges) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE post SET title = $1, body = $2, status = 'Published', \
             created_at = NOW(), updated_at = NOW() \
             WHERE id = $3 AND status = 'Draft'",
        )
        .bind(&changes.title)
        .bind(&changes.body)
        .bind(&changes.id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        replace_tags(&mut tx, &changes.id, &changes.tags).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn soft_delete_post(&self, id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        // Row stays so comments and votes keep their foreign keys
        let result = sqlx::query(
            "UPDATE post SET title = '', body = '', status = 'Deleted', updated_at = NOW() \
             WHERE id = $1 AND status <> 'Deleted'",
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound);
        }

        sqlx::query("DELETE FROM post_tag WHERE post_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_tags(&self) -> StoreResult<Vec<String>> {
        let tags = sqlx::query_scalar::<_, String>("SELECT DISTINCT tag FROM post_tag ORDER BY tag")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }
}
