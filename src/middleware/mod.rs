//! Request pipeline stages, outermost first:
//! request logging, error catching, translator, authentication, authorization.

pub mod auth;
pub mod authorize;
pub mod context;
pub mod errors;
pub mod logger;
pub mod response;
pub mod translator;

pub use auth::authenticate;
pub use authorize::authorize;
pub use context::{ErrorSlot, Identity, RequestContext};
pub use errors::catch_errors;
pub use logger::log_requests;
pub use response::ApiResponse;
pub use translator::resolve_translator;
