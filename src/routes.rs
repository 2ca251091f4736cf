// src/routes.rs

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, patch, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::{
    handlers::{auth, comments, contact, posts, upload},
    openapi::openapi_json,
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Assembles the main application router.
///
/// * Public reads: posts, comments, comment trees.
/// * Bearer-protected writes: comments, uploads, `/auth/me`.
/// * Admin-only: post CRUD and pinning, behind auth then role check.
pub fn create_router(state: AppState) -> Router {
    let origins: Vec<HeaderValue> = state
        .config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.config.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/me", get(auth::me).layer(require_auth.clone()));

    let post_routes = Router::new()
        .route("/", get(posts::list_posts))
        .route("/slug/{slug}", get(posts::get_post_by_slug))
        .route(
            "/{post_id}/comments",
            get(comments::list_comments)
                .merge(post(comments::create_comment).layer(require_auth.clone())),
        )
        .route("/{post_id}/comments/tree", get(comments::comment_tree));

    let comment_routes = Router::new()
        .route(
            "/{id}",
            patch(comments::update_comment).delete(comments::delete_comment),
        )
        .layer(require_auth.clone());

    let admin_routes = Router::new()
        .route(
            "/posts",
            get(posts::admin_list_posts).post(posts::create_post),
        )
        .route(
            "/posts/{id}",
            get(posts::admin_get_post)
                .patch(posts::update_post)
                .delete(posts::delete_post),
        )
        .route("/comments/{id}/pin", put(comments::pin_comment))
        // Auth runs first, then the role check
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_auth.clone());

    let upload_routes = Router::new()
        .route("/", post(upload::upload_image))
        .layer(DefaultBodyLimit::max(
            state.config.max_upload_bytes + MULTIPART_OVERHEAD,
        ))
        .layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/posts", post_routes)
        .nest("/api/comments", comment_routes)
        .nest("/api/admin", admin_routes)
        .nest("/api/upload", upload_routes)
        .route("/api/contact", post(contact::send_contact))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
