use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Router,
};
use tracing::{info, instrument};

use super::{
    dto::{Pagination, PostPage, PostRequest},
    repo_types::{NewPost, PostView},
};
use crate::{
    auth::{extractors::CurrentUser, policy::require_owner},
    error::{AppError, Message},
    extract::Json,
    state::AppState,
    validation::{parse_id, present, Validator},
};

const POST_NOT_FOUND: &str = "Post not found";
const MAX_TITLE_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 500;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route(
            "/posts/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
}

fn check_lengths(v: &mut Validator, title: &str, description: &str) {
    v.max_chars(
        "title",
        title,
        MAX_TITLE_CHARS,
        "Title cannot exceed 200 characters",
    )
    .max_chars(
        "description",
        description,
        MAX_DESCRIPTION_CHARS,
        "Description cannot exceed 500 characters",
    );
}

#[instrument(skip(state))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(p): Query<Pagination>,
) -> Result<Json<PostPage>, AppError> {
    let (page, limit) = (p.page(), p.limit());
    let (posts, total) = state.posts.list_page(limit, p.offset()).await?;
    Ok(Json(PostPage::new(posts, total, page, limit)))
}

#[instrument(skip(state))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PostView>, AppError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let post = state
        .posts
        .find_view(id)
        .await?
        .ok_or(AppError::NotFound(POST_NOT_FOUND))?;
    Ok(Json(post))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PostRequest>,
) -> Result<(StatusCode, Json<PostView>), AppError> {
    let (Some(title), Some(body)) = (present(&payload.title), present(&payload.body)) else {
        return Err(AppError::bad_request("Title and body are required"));
    };
    let title = title.trim();
    let description = payload.description.as_deref().unwrap_or_default().trim();

    let mut v = Validator::new();
    check_lengths(&mut v, title, description);
    v.finish()?;

    let post = state
        .posts
        .create(NewPost {
            title: title.to_string(),
            description: description.to_string(),
            body: body.to_string(),
            author_id: user.id,
        })
        .await?;
    info!(post_id = %post.id, "post created");

    Ok((StatusCode::CREATED, Json(post)))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<PostRequest>,
) -> Result<Json<PostView>, AppError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let mut post = state
        .posts
        .find(id)
        .await?
        .ok_or(AppError::NotFound(POST_NOT_FOUND))?;
    require_owner(user.id, post.author_id, "Not authorized to edit this post")?;

    if let Some(title) = payload.title {
        post.title = title.trim().to_string();
    }
    if let Some(description) = payload.description {
        post.description = description.trim().to_string();
    }
    if let Some(body) = payload.body {
        post.body = body;
    }

    let mut v = Validator::new();
    v.required("title", &post.title, "Title is required")
        .required("body", &post.body, "Body is required");
    check_lengths(&mut v, &post.title, &post.description);
    v.finish()?;

    let view = state
        .posts
        .save(&post)
        .await?
        .ok_or(AppError::NotFound(POST_NOT_FOUND))?;
    info!(post_id = %view.id, "post updated");
    Ok(Json(view))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_post(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    let id = parse_id(&id, POST_NOT_FOUND)?;
    let post = state
        .posts
        .find(id)
        .await?
        .ok_or(AppError::NotFound(POST_NOT_FOUND))?;
    require_owner(user.id, post.author_id, "Not authorized to delete this post")?;

    state.posts.delete_with_comments(post.id).await?;
    info!(post_id = %post.id, "post deleted with its comments");
    Ok(Json(Message {
        message: "Post deleted",
    }))
}
