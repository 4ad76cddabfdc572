use super::extract::{AuthUser, JsonBody, ACCESS_COOKIE, REFRESH_COOKIE};
use super::response::ApiResponse;
use super::upload::read_multipart;
use super::AppState;
use crate::application::users::{AccountChanges, Credentials, PasswordChange, Registration};
use crate::domain::views::{ChannelProfile, Session, TokenPair, UserView, VideoView};
use crate::error::AppError;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/register",
            post(register).layer(DefaultBodyLimit::disable()),
        )
        .route("/login", post(login))
        .route("/refresh-token", post(refresh_token))
        .route("/logout", post(logout))
        .route("/change-password", post(change_password))
        .route("/current-user", get(current_user))
        .route("/update-account", patch(update_account))
        .route(
            "/avatar",
            patch(update_avatar).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/cover-image",
            patch(update_cover_image).layer(DefaultBodyLimit::disable()),
        )
        .route("/c/:username", get(channel_profile))
        .route("/history", get(watch_history))
}

fn session_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

fn with_tokens(jar: CookieJar, tokens: &TokenPair, secure: bool) -> CookieJar {
    jar.add(session_cookie(ACCESS_COOKIE, tokens.access_token.clone(), secure))
        .add(session_cookie(REFRESH_COOKIE, tokens.refresh_token.clone(), secure))
}

async fn register(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<ApiResponse<UserView>, AppError> {
    let mut form = read_multipart(multipart, &state.temp_dir).await?;
    let registration = Registration {
        full_name: form.text("fullName"),
        email: form.text("email"),
        username: form.text("username"),
        password: form.text("password"),
        avatar: form.file("avatar"),
        cover_image: form.file("coverImage"),
    };
    let user = state.services.users.register(registration).await?;
    Ok(ApiResponse::created(user, "User registered successfully"))
}

#[derive(Debug, Default, Deserialize)]
struct LoginBody {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(body): JsonBody<LoginBody>,
) -> Result<(CookieJar, ApiResponse<Session>), AppError> {
    let session = state
        .services
        .users
        .login(Credentials {
            username: body.username,
            email: body.email,
            password: body.password,
        })
        .await?;
    tracing::info!("user {} logged in", session.user.username);
    let tokens = TokenPair {
        access_token: session.access_token.clone(),
        refresh_token: session.refresh_token.clone(),
    };
    Ok((
        with_tokens(jar, &tokens, state.secure_cookies),
        ApiResponse::ok(session, "User logged in successfully"),
    ))
}

async fn logout(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<Value>), AppError> {
    state.services.users.logout(user.id).await?;
    let jar = jar
        .remove(Cookie::build(ACCESS_COOKIE).path("/"))
        .remove(Cookie::build(REFRESH_COOKIE).path("/"));
    Ok((jar, ApiResponse::ok(json!({}), "User logged out")))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody {
    refresh_token: Option<String>,
}

async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Option<Json<RefreshBody>>,
) -> Result<(CookieJar, ApiResponse<TokenPair>), AppError> {
    let incoming = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|token| !token.is_empty())
        .or_else(|| body.and_then(|Json(body)| body.refresh_token));
    let tokens = state.services.users.refresh(incoming.as_deref()).await?;
    Ok((
        with_tokens(jar, &tokens, state.secure_cookies),
        ApiResponse::ok(tokens, "Access token refreshed"),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PasswordBody {
    old_password: Option<String>,
    new_password: Option<String>,
    confirm_password: Option<String>,
}

async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<PasswordBody>,
) -> Result<ApiResponse<Value>, AppError> {
    state
        .services
        .users
        .change_password(
            &user,
            PasswordChange {
                old_password: body.old_password,
                new_password: body.new_password,
                confirm_password: body.confirm_password,
            },
        )
        .await?;
    Ok(ApiResponse::ok(json!({}), "Password changed successfully"))
}

async fn current_user(AuthUser(user): AuthUser) -> ApiResponse<UserView> {
    ApiResponse::ok(UserView::from(&user), "Current user fetched successfully")
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountBody {
    full_name: Option<String>,
    email: Option<String>,
}

async fn update_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    JsonBody(body): JsonBody<AccountBody>,
) -> Result<ApiResponse<UserView>, AppError> {
    let updated = state
        .services
        .users
        .update_account(
            &user,
            AccountChanges {
                full_name: body.full_name,
                email: body.email,
            },
        )
        .await?;
    Ok(ApiResponse::ok(updated, "Account details updated successfully"))
}

async fn update_avatar(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<ApiResponse<UserView>, AppError> {
    let mut form = read_multipart(multipart, &state.temp_dir).await?;
    let updated = state
        .services
        .users
        .update_avatar(&user, form.file("avatar"))
        .await?;
    Ok(ApiResponse::ok(updated, "Avatar updated successfully"))
}

async fn update_cover_image(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    multipart: Multipart,
) -> Result<ApiResponse<UserView>, AppError> {
    let mut form = read_multipart(multipart, &state.temp_dir).await?;
    let updated = state
        .services
        .users
        .update_cover_image(&user, form.file("coverImage"))
        .await?;
    Ok(ApiResponse::ok(updated, "Cover image updated successfully"))
}

async fn channel_profile(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    Path(username): Path<String>,
) -> Result<ApiResponse<ChannelProfile>, AppError> {
    let channel = state
        .services
        .users
        .channel_profile(&username, viewer.id)
        .await?;
    Ok(ApiResponse::ok(channel, "User channel fetched successfully"))
}

async fn watch_history(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<ApiResponse<Vec<VideoView>>, AppError> {
    let history = state.services.users.watch_history(user.id).await?;
    Ok(ApiResponse::ok(history, "Watch history fetched successfully"))
}
