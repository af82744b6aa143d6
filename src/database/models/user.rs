use sqlx::FromRow;

/// Stored account. The password column only ever holds a PHC-format hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub username: String,
    #[sqlx(rename = "password")]
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
}
