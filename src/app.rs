use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;

use crate::authz::PolicyStore;
use crate::config::{AppConfig, SecurityConfig};
use crate::database::Store;
use crate::handlers::{self, comments, posts, session, tags, users};
use crate::i18n::UniversalTranslator;
use crate::middleware::{authenticate, authorize, catch_errors, log_requests, resolve_translator};

/// Everything a request stage or handler may reach. Cloned per request.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub policies: PolicyStore,
    pub translators: Arc<UniversalTranslator>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, policies: PolicyStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
            policies,
            translators: Arc::new(UniversalTranslator::default()),
        }
    }
}

/// The full HTTP surface.
///
/// Stages run outermost first: CORS, request logging, error catching, then
/// (for matched API routes only) translator, authentication, authorization.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.security);

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .fallback(handlers::not_found)
        .layer(from_fn(catch_errors))
        .layer(from_fn(log_requests))
        .layer(cors)
        .with_state(state)
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/session", post(session::login).delete(session::logout))
        .route("/tags", get(tags::list_tags))
        // Accounts and the caller's own lists
        .route("/users/:username", post(users::create_user))
        .route("/users/:username/posts", get(posts::list_my_posts))
        .route("/users/:username/drafts", get(posts::list_my_drafts))
        .route("/users/:username/liked-posts", get(posts::list_liked_posts))
        .route("/users/:username/comments", get(comments::list_my_comments))
        .route("/users/:username/liked-comments", get(comments::list_liked_comments))
        // Posts
        .route("/posts", get(posts::list_posts))
        .route(
            "/posts/:post_id",
            get(posts::get_post)
                .post(posts::create_post)
                .put(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/posts/:post_id/conversion", post(posts::publish_draft))
        .route("/posts/:post_id/comments", get(comments::list_post_comments))
        .route(
            "/posts/:post_id/vote",
            put(posts::upsert_post_vote).delete(posts::delete_post_vote),
        )
        // Comments
        .route(
            "/comments/:comment_id",
            post(comments::create_comment)
                .put(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route(
            "/comments/:comment_id/vote",
            put(comments::upsert_comment_vote).delete(comments::delete_comment_vote),
        )
        // Last added runs first
        .route_layer(from_fn_with_state(state.clone(), authorize))
        .route_layer(from_fn_with_state(state.clone(), authenticate))
        .route_layer(from_fn_with_state(state, resolve_translator))
}

fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(event = "CORS-ORIGIN-IGNORED", origin = %origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([HeaderName::from_static("x-requested-with"), CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
}

/// Serve until the listener fails. Peer addresses reach the logger through `ConnectInfo`.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    let app = router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app).await
}
