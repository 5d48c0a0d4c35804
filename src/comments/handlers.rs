use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Router,
};
use tracing::{debug, info, instrument};

use super::{
    dto::CommentRequest,
    repo_types::{CommentView, NewComment},
};
use crate::{
    auth::{extractors::CurrentUser, policy::require_owner},
    error::{AppError, Message},
    extract::Json,
    state::AppState,
    validation::{parse_id, present, Validator},
};

const POST_NOT_FOUND: &str = "Post not found";
const COMMENT_NOT_FOUND: &str = "Comment not found";
const MAX_COMMENT_CHARS: usize = 1000;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/posts/:id/comments",
            get(list_comments).post(create_comment),
        )
        .route("/posts/:id/comments/:comment_id", delete(delete_comment))
}

/// Oldest first. An unknown post simply has no comments.
#[instrument(skip(state))]
pub async fn list_comments(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> Result<Json<Vec<CommentView>>, AppError> {
    let post_id = parse_id(&post_id, POST_NOT_FOUND)?;
    Ok(Json(state.comments.list_for_post(post_id).await?))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    Json(payload): Json<CommentRequest>,
) -> Result<(StatusCode, Json<CommentView>), AppError> {
    let post_id = parse_id(&post_id, POST_NOT_FOUND)?;
    if state.posts.find(post_id).await?.is_none() {
        return Err(AppError::NotFound(POST_NOT_FOUND));
    }

    let body = present(&payload.body)
        .ok_or_else(|| AppError::bad_request("Comment body is required"))?;
    Validator::new()
        .max_chars(
            "body",
            body,
            MAX_COMMENT_CHARS,
            "Comment cannot exceed 1000 characters",
        )
        .finish()?;

    let comment = state
        .comments
        .create(NewComment {
            body: body.to_string(),
            author_id: user.id,
            post_id,
        })
        .await?;
    info!(comment_id = %comment.id, %post_id, "comment created");

    Ok((StatusCode::CREATED, Json(comment)))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_comment(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> Result<Json<Message>, AppError> {
    let post_id = parse_id(&post_id, COMMENT_NOT_FOUND)?;
    let comment_id = parse_id(&comment_id, COMMENT_NOT_FOUND)?;

    let comment = state
        .comments
        .find(comment_id)
        .await?
        .filter(|c| c.post_id == post_id)
        .ok_or_else(|| {
            debug!(%comment_id, %post_id, "comment missing or under another post");
            AppError::NotFound(COMMENT_NOT_FOUND)
        })?;
    require_owner(
        user.id,
        comment.author_id,
        "Not authorized to delete this comment",
    )?;

    state.comments.delete(comment.id).await?;
    info!(%comment_id, "comment deleted");
    Ok(Json(Message {
        message: "Comment deleted",
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::Method;
    use serde_json::{json, Value};
    use uuid::Uuid;

    use crate::testing::{test_app, TestApp};

    use super::*;

    async fn new_post(app: &TestApp, token: &str) -> String {
        let (status, body) = app
            .call(
                Method::POST,
                "/api/posts",
                Some(token),
                Some(json!({ "title": "Post", "body": "text" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["_id"].as_str().unwrap().to_string()
    }

    async fn comment(app: &TestApp, token: &str, post_id: &str, body: &str) -> (StatusCode, Value) {
        app.call(
            Method::POST,
            &format!("/api/posts/{post_id}/comments"),
            Some(token),
            Some(json!({ "body": body })),
        )
        .await
    }

    #[tokio::test]
    async fn comments_are_listed_oldest_first_with_author() {
        let app = test_app();
        let (alice, alice_id) = app.register("Alice", "alice@x.io", "secret1").await;
        let post_id = new_post(&app, &alice).await;

        for text in ["first", "second"] {
            let (status, _) = comment(&app, &alice, &post_id, text).await;
            assert_eq!(status, StatusCode::CREATED);
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let uri = format!("/api/posts/{post_id}/comments");
        let (status, body) = app.call(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["body"], "first");
        assert_eq!(list[0]["author"]["_id"], alice_id);
        assert_eq!(list[0]["post"], post_id);
    }

    #[tokio::test]
    async fn create_checks_post_then_body() {
        let app = test_app();
        let (token, _) = app.register("Alice", "alice@x.io", "secret1").await;

        let (status, body) = comment(&app, &token, &Uuid::new_v4().to_string(), "hi").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Post not found");

        let post_id = new_post(&app, &token).await;
        let (status, body) = comment(&app, &token, &post_id, " ").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Comment body is required");

        let (status, _) = comment(&app, &token, &post_id, &"x".repeat(1001)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn only_comment_author_may_delete() {
        let app = test_app();
        let (alice, _) = app.register("Alice", "alice@x.io", "secret1").await;
        let (bob, _) = app.register("Bob", "bob@x.io", "secret1").await;
        let post_id = new_post(&app, &alice).await;
        let (_, created) = comment(&app, &bob, &post_id, "bob was here").await;
        let uri = format!(
            "/api/posts/{post_id}/comments/{}",
            created["_id"].as_str().unwrap()
        );

        // Owning the post does not grant rights over other people's comments.
        let (status, body) = app.call(Method::DELETE, &uri, Some(&alice), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Not authorized to delete this comment");

        let (status, body) = app.call(Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Comment deleted");

        let (status, _) = app.call(Method::DELETE, &uri, Some(&bob), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn comment_under_wrong_post_is_not_found() {
        let app = test_app();
        let (token, _) = app.register("Alice", "alice@x.io", "secret1").await;
        let post_a = new_post(&app, &token).await;
        let post_b = new_post(&app, &token).await;
        let (_, created) = comment(&app, &token, &post_a, "on a").await;
        let uri = format!(
            "/api/posts/{post_b}/comments/{}",
            created["_id"].as_str().unwrap()
        );
        let (status, _) = app.call(Method::DELETE, &uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn deleting_post_removes_its_comments() {
        let app = test_app();
        let (token, _) = app.register("Alice", "alice@x.io", "secret1").await;
        let post_id = new_post(&app, &token).await;
        comment(&app, &token, &post_id, "soon gone").await;

        let (status, _) = app
            .call(Method::DELETE, &format!("/api/posts/{post_id}"), Some(&token), None)
            .await;
        assert_eq!(status, StatusCode::OK);

        let (_, body) = app
            .call(Method::GET, &format!("/api/posts/{post_id}/comments"), None, None)
            .await;
        assert_eq!(body, json!([]));
    }
}
