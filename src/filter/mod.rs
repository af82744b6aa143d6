//! List filters for posts and comments and the SQL they compile to.
//!
//! Every predicate is optional and joined with `AND`. User-supplied values
//! are always bound parameters; only fixed fragments reach the query text.

pub mod comment_select;
pub mod error;
pub mod list_query;
pub mod post_select;
pub mod types;

pub use comment_select::comment_select;
pub use error::FilterError;
pub use list_query::ListQuery;
pub use post_select::post_select;
pub use types::*;
