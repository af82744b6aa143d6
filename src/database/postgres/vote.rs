use async_trait::async_trait;

use super::PgStore;
use crate::database::models::{Vote, VoteTarget};
use crate::database::store::{StoreResult, VoteRepo};

#[async_trait]
impl VoteRepo for PgStore {
    async fn upsert_vote(&self, vote: Vote) -> StoreResult<()> {
        let query = match vote.target {
            VoteTarget::Post(_) => {
                "INSERT INTO post_vote (viewer, post_id, vote) VALUES ($1, $2, $3) \
                 ON CONFLICT (viewer, post_id) DO UPDATE SET vote = EXCLUDED.vote"
            }
            VoteTarget::Comment(_) => {
                "INSERT INTO comment_vote (viewer, comment_id, vote) VALUES ($1, $2, $3) \
                 ON CONFLICT (viewer, comment_id) DO UPDATE SET vote = EXCLUDED.vote"
            }
        };

        sqlx::query(query)
            .bind(&vote.viewer)
            .bind(vote.target.id())
            .bind(vote.value.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_vote(&self, target: &VoteTarget, viewer: &str) -> StoreResult<()> {
        let query = match target {
            VoteTarget::Post(_) => "DELETE FROM post_vote WHERE post_id = $1 AND viewer = $2",
            VoteTarget::Comment(_) => "DELETE FROM comment_vote WHERE comment_id = $1 AND viewer = $2",
        };

        // Zero rows affected is fine: the caller already has no vote
        sqlx::query(query)
            .bind(target.id())
            .bind(viewer)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
