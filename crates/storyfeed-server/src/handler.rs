use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Serialize;
use serde_json::{json, Value};
use storyfeed_core::{
    DeleteRequest, DeletedUser, Feed, FeedError, NewStory, NewUser, StoryListQuery, StoryUpdate,
    TallyView, UserUpdate, VoteRequest,
};
use storyfeed_types::{RecordId, Story, UserView, VoteKind};

use crate::error::ApiResult;

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "storyfeed",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---------------------------------------------------------------------------
// Stories
// ---------------------------------------------------------------------------

pub async fn list_stories(
    State(feed): State<Feed>,
    query: Result<Query<StoryListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Story>>> {
    let Query(query) = query?;
    let stories = feed
        .stories()
        .list_stories(query.user.as_deref(), query.amount)
        .await?;
    Ok(Json(stories))
}

pub async fn create_story(
    State(feed): State<Feed>,
    payload: Result<Json<NewStory>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Story>)> {
    let Json(req) = payload?;
    let story = feed.stories().create_story(req).await?;
    Ok((StatusCode::CREATED, Json(story)))
}

pub async fn update_story(
    State(feed): State<Feed>,
    payload: Result<Json<StoryUpdate>, JsonRejection>,
) -> ApiResult<Json<Story>> {
    let Json(req) = payload?;
    Ok(Json(feed.stories().update_story(req).await?))
}

#[derive(Serialize)]
pub struct DeletedStory {
    pub id: RecordId,
    pub message: String,
}

pub async fn delete_story(
    State(feed): State<Feed>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> ApiResult<Json<DeletedStory>> {
    let Json(req) = payload?;
    let id = feed.stories().delete_story(req.id.as_deref()).await?;
    Ok(Json(DeletedStory {
        id,
        message: format!("story {id} deleted"),
    }))
}

pub async fn vote(
    State(feed): State<Feed>,
    Path((story_id, vote)): Path<(String, String)>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> ApiResult<Json<TallyView>> {
    let Json(req) = payload?;
    let voter = req
        .user_id
        .ok_or_else(|| FeedError::invalid_payload("userId is required"))?;
    let kind = VoteKind::parse(&vote);
    Ok(Json(feed.votes().apply_vote(&story_id, &voter, &kind).await?))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub async fn list_users(State(feed): State<Feed>) -> ApiResult<Json<Vec<UserView>>> {
    Ok(Json(feed.users().list_users().await?))
}

pub async fn get_user(
    State(feed): State<Feed>,
    Path(username): Path<String>,
) -> ApiResult<Json<Vec<UserView>>> {
    Ok(Json(feed.users().find_by_username(&username).await?))
}

pub async fn create_user(
    State(feed): State<Feed>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<UserView>)> {
    let Json(req) = payload?;
    let user = feed.users().create_user(req).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    State(feed): State<Feed>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> ApiResult<Json<UserView>> {
    let Json(req) = payload?;
    Ok(Json(feed.users().update_user(req).await?))
}

#[derive(Serialize)]
pub struct DeletedUserResponse {
    #[serde(flatten)]
    pub deleted: DeletedUser,
    pub message: String,
}

pub async fn delete_user(
    State(feed): State<Feed>,
    payload: Result<Json<DeleteRequest>, JsonRejection>,
) -> ApiResult<Json<DeletedUserResponse>> {
    let Json(req) = payload?;
    let deleted = feed.users().delete_user(req.id.as_deref()).await?;
    let message = deleted.message();
    Ok(Json(DeletedUserResponse { deleted, message }))
}
