use async_trait::async_trait;

use super::PgStore;
use crate::database::models::{NewUser, User};
use crate::database::store::{StoreResult, UserRepo};

#[async_trait]
impl UserRepo for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<()> {
        sqlx::query("INSERT INTO user_account (username, password) VALUES ($1, $2)")
            .bind(&user.username)
            .bind(&user.password_hash)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_user(&self, username: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT username, password FROM user_account WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}
