pub mod error;
pub mod manager;
pub mod models;
pub mod postgres;
pub mod query_builder;
pub mod store;

pub use error::DatabaseError;
pub use postgres::PgStore;
pub use store::{CommentRepo, PostRepo, Store, UserRepo, VoteRepo};
