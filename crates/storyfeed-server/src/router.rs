use axum::routing::{get, patch};
use axum::Router;
use storyfeed_core::Feed;
use tower_http::trace::TraceLayer;

use crate::handler;

/// Build the axum router with all storyfeed endpoints.
pub fn build_router(feed: Feed) -> Router {
    Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route(
            "/stories",
            get(handler::list_stories)
                .post(handler::create_story)
                .patch(handler::update_story)
                .delete(handler::delete_story),
        )
        .route("/stories/:id/:vote", patch(handler::vote))
        .route(
            "/users",
            get(handler::list_users)
                .post(handler::create_user)
                .patch(handler::update_user)
                .delete(handler::delete_user),
        )
        .route("/users/:username", get(handler::get_user))
        .layer(TraceLayer::new_for_http())
        .with_state(feed)
}
