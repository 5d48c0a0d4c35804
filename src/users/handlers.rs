use axum::{
    extract::{Path, State},
    routing::{get, put},
    Router,
};
use tracing::{info, instrument};

use super::{
    dto::{ChangePasswordRequest, ProfileResponse, ProfileUpdate},
    repo_types::User,
};
use crate::{
    auth::{extractors::CurrentUser, password, policy::require_owner},
    error::{AppError, Message},
    extract::Json,
    state::AppState,
    validation::{non_empty, parse_id, Validator},
};

const USER_NOT_FOUND: &str = "User not found";
const MIN_PASSWORD_CHARS: usize = 6;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users/:id", get(get_profile).put(update_profile))
        .route("/users/:id/password", put(change_password))
}

#[instrument(skip(state))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let user = state
        .users
        .find_by_id(id)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))?;
    let posts = state.posts.list_titles_by_author(user.id).await?;
    Ok(Json(ProfileResponse { user, posts }))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ProfileUpdate>,
) -> Result<Json<User>, AppError> {
    require_owner(user.id, &id, "Not authorized to edit this profile")?;

    let mut updated = user;
    payload.apply_to(&mut updated);
    Validator::new()
        .required("name", &updated.name, "Name is required")
        .max_chars("name", &updated.name, 60, "Name cannot exceed 60 characters")
        .max_chars("bio", &updated.bio, 300, "Bio cannot exceed 300 characters")
        .finish()?;

    let saved = state
        .users
        .save_profile(&updated)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))?;
    info!("profile updated");
    Ok(Json(saved))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<Message>, AppError> {
    require_owner(user.id, &id, "Not authorized")?;

    let (Some(current), Some(new)) = (
        non_empty(&payload.current_password),
        non_empty(&payload.new_password),
    ) else {
        return Err(AppError::bad_request("Both fields are required"));
    };
    if new.chars().count() < MIN_PASSWORD_CHARS {
        return Err(AppError::bad_request(
            "New password must be at least 6 characters",
        ));
    }

    let hash = state
        .users
        .find_password_hash(user.id)
        .await?
        .ok_or(AppError::NotFound(USER_NOT_FOUND))?;
    if !password::verify(current, &hash).await? {
        return Err(AppError::bad_request("Current password is incorrect"));
    }

    state
        .users
        .update_password(user.id, &password::hash(new).await?)
        .await?;
    info!("password changed");
    Ok(Json(Message {
        message: "Password changed successfully",
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use uuid::Uuid;

    use crate::testing::test_app;

    #[tokio::test]
    async fn public_profile_lists_post_titles() {
        let app = test_app();
        let (token, id) = app.register("Alice", "alice@x.io", "secret1").await;
        app.call(
            Method::POST,
            "/api/posts",
            Some(&token),
            Some(json!({ "title": "Hello", "body": "world" })),
        )
        .await;

        let (status, body) = app.call(Method::GET, &format!("/api/users/{id}"), None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["user"]["_id"], id);
        assert_eq!(body["user"]["bio"], "");
        assert!(body["user"].get("password").is_none());
        assert!(body["user"].get("passwordHash").is_none());
        assert_eq!(body["posts"][0]["title"], "Hello");
        assert!(body["posts"][0].get("body").is_none());

        let uri = format!("/api/users/{}", Uuid::new_v4());
        let (status, body) = app.call(Method::GET, &uri, None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "User not found");
    }

    #[tokio::test]
    async fn profile_update_is_self_only_and_partial() {
        let app = test_app();
        let (alice, alice_id) = app.register("Alice", "alice@x.io", "secret1").await;
        let (bob, _) = app.register("Bob", "bob@x.io", "secret1").await;
        let uri = format!("/api/users/{alice_id}");

        let (status, body) = app
            .call(Method::PUT, &uri, Some(&bob), Some(json!({ "bio": "hacked" })))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Not authorized to edit this profile");

        let (status, body) = app
            .call(
                Method::PUT,
                &uri,
                Some(&alice),
                Some(json!({ "bio": "writer", "age": 31, "website": " https://a.dev " })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Alice");
        assert_eq!(body["bio"], "writer");
        assert_eq!(body["age"], "31");
        assert_eq!(body["website"], "https://a.dev");

        let (status, body) = app
            .call(Method::PUT, &uri, Some(&alice), Some(json!({ "bio": "x".repeat(301) })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "bio");
    }

    #[tokio::test]
    async fn change_password_flow() {
        let app = test_app();
        let (token, id) = app.register("Alice", "alice@x.io", "secret1").await;
        let (other, _) = app.register("Bob", "bob@x.io", "secret1").await;
        let uri = format!("/api/users/{id}/password");
        let (app, uri) = (&app, uri.as_str());
        let change = move |token: String, body: serde_json::Value| async move {
            app.call(Method::PUT, uri, Some(&token), Some(body)).await
        };

        let (status, body) = change(
            other,
            json!({ "currentPassword": "secret1", "newPassword": "newpass1" }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], "Not authorized");

        let (status, body) = change(token.clone(), json!({ "currentPassword": "secret1" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Both fields are required");

        let (status, body) = change(
            token.clone(),
            json!({ "currentPassword": "secret1", "newPassword": "123" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "New password must be at least 6 characters");

        let (status, body) = change(
            token.clone(),
            json!({ "currentPassword": "wrong-one", "newPassword": "newpass1" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Current password is incorrect");

        let (status, body) = change(
            token.clone(),
            json!({ "currentPassword": "secret1", "newPassword": "newpass1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Password changed successfully");

        let (status, _) = app
            .call(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": "alice@x.io", "password": "newpass1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }
}
