use super::uploads::{discard, store_required, store_staged};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::TokenService;
use crate::domain::models::{MediaAsset, User};
use crate::domain::validation::{non_blank, normalize_email, normalize_username, required};
use crate::domain::views::{ChannelProfile, Session, TokenPair, UserView, VideoView};
use crate::error::AppError;
use crate::ports::media::{MediaKind, MediaStorage, StagedFile};
use crate::ports::repository::{UserChanges, UserRepository, VideoRepository};
use bson::oid::ObjectId;
use bson::DateTime;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct Registration {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<StagedFile>,
    pub cover_image: Option<StagedFile>,
}

#[derive(Debug, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Default)]
pub struct PasswordChange {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_password: Option<String>,
}

#[derive(Debug, Default)]
pub struct AccountChanges {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    videos: Arc<dyn VideoRepository>,
    media: Arc<dyn MediaStorage>,
    tokens: TokenService,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        videos: Arc<dyn VideoRepository>,
        media: Arc<dyn MediaStorage>,
        tokens: TokenService,
    ) -> Self {
        Self {
            users,
            videos,
            media,
            tokens,
        }
    }

    pub async fn register(&self, registration: Registration) -> Result<UserView, AppError> {
        let missing = "All fields are required";
        let full_name = required(registration.full_name.as_deref(), missing)?;
        let email = normalize_email(&required(registration.email.as_deref(), missing)?);
        let username = normalize_username(&required(registration.username.as_deref(), missing)?);
        let password = required(registration.password.as_deref(), missing)?;

        if self
            .users
            .find_user_by_login(Some(&username), Some(&email))
            .await?
            .is_some()
        {
            return Err(AppError::conflict(
                "User with email or username already exists",
            ));
        }

        let avatar: MediaAsset = store_required(
            self.media.as_ref(),
            registration.avatar,
            MediaKind::Image,
            "Avatar file is required",
        )
        .await?
        .into();
        let cover_image: Option<MediaAsset> = match registration.cover_image {
            Some(file) => match store_staged(self.media.as_ref(), file, MediaKind::Image).await {
                Ok(uploaded) => Some(uploaded.into()),
                Err(err) => {
                    discard(self.media.as_ref(), &avatar, MediaKind::Image).await;
                    return Err(err);
                }
            },
            None => None,
        };

        let now = DateTime::now();
        let user = User {
            id: ObjectId::new(),
            username,
            email,
            full_name,
            avatar,
            cover_image,
            watch_history: Vec::new(),
            password: hash_password(password).await?,
            refresh_token: None,
            created_at: now,
            updated_at: now,
        };
        if let Err(err) = self.users.insert_user(&user).await {
            discard(self.media.as_ref(), &user.avatar, MediaKind::Image).await;
            if let Some(cover) = &user.cover_image {
                discard(self.media.as_ref(), cover, MediaKind::Image).await;
            }
            return Err(err.into());
        }

        tracing::info!("registered user {}", user.username);
        Ok(UserView::from(&user))
    }

    pub async fn login(&self, credentials: Credentials) -> Result<Session, AppError> {
        let username = non_blank(credentials.username.as_deref()).map(|u| normalize_username(&u));
        let email = non_blank(credentials.email.as_deref()).map(|e| normalize_email(&e));
        if username.is_none() && email.is_none() {
            return Err(AppError::bad_request("Username or email is required"));
        }
        let password = required(credentials.password.as_deref(), "Password is required")?;

        let user = self
            .users
            .find_user_by_login(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| AppError::not_found("User does not exist"))?;
        if !verify_password(password, user.password.clone()).await? {
            return Err(AppError::unauthorized("Password is incorrect"));
        }

        let tokens = self.issue_tokens(&user).await?;
        Ok(Session {
            user: UserView::from(&user),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    pub async fn logout(&self, user_id: ObjectId) -> Result<(), AppError> {
        self.users.set_refresh_token(user_id, None).await?;
        Ok(())
    }

    /// Exchange a refresh token for a fresh pair. The old refresh token stops working.
    pub async fn refresh(&self, token: Option<&str>) -> Result<TokenPair, AppError> {
        let token = non_blank(token).ok_or_else(|| AppError::unauthorized("Unauthorized request"))?;
        let claims = self.tokens.verify_refresh(&token)?;
        let user = self
            .users
            .find_user(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid refresh token"))?;
        if user.refresh_token.as_deref() != Some(token.as_str()) {
            return Err(AppError::unauthorized("Refresh token is expired or used"));
        }
        self.issue_tokens(&user).await
    }

    async fn issue_tokens(&self, user: &User) -> Result<TokenPair, AppError> {
        let access_token = self.tokens.issue_access(user)?;
        let refresh_token = self.tokens.issue_refresh(user.id)?;
        self.users
            .set_refresh_token(user.id, Some(refresh_token.clone()))
            .await?;
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Resolve an access token to the user it was issued for.
    pub async fn authenticate(&self, token: &str) -> Result<User, AppError> {
        let claims = self.tokens.verify_access(token)?;
        self.users
            .find_user(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::unauthorized("Invalid access token"))
    }

    pub async fn change_password(&self, user: &User, change: PasswordChange) -> Result<(), AppError> {
        let missing = "All fields are required";
        let old_password = required(change.old_password.as_deref(), missing)?;
        let new_password = required(change.new_password.as_deref(), missing)?;
        let confirm_password = required(change.confirm_password.as_deref(), missing)?;
        if new_password != confirm_password {
            return Err(AppError::bad_request(
                "New password and confirm password must match",
            ));
        }
        if !verify_password(old_password, user.password.clone()).await? {
            return Err(AppError::bad_request("Invalid old password"));
        }

        let changes = UserChanges {
            password: Some(hash_password(new_password).await?),
            ..Default::default()
        };
        self.users
            .update_user(user.id, changes)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(())
    }

    pub async fn update_account(
        &self,
        user: &User,
        changes: AccountChanges,
    ) -> Result<UserView, AppError> {
        let full_name = non_blank(changes.full_name.as_deref());
        let email = non_blank(changes.email.as_deref()).map(|e| normalize_email(&e));
        if full_name.is_none() && email.is_none() {
            return Err(AppError::bad_request("At least one field is required"));
        }
        if let Some(email) = &email {
            let taken = self.users.find_user_by_login(None, Some(email)).await?;
            if taken.is_some_and(|other| other.id != user.id) {
                return Err(AppError::conflict("Email is already in use"));
            }
        }

        let updated = self
            .users
            .update_user(
                user.id,
                UserChanges {
                    full_name,
                    email,
                    ..Default::default()
                },
            )
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(UserView::from(&updated))
    }

    pub async fn update_avatar(
        &self,
        user: &User,
        file: Option<StagedFile>,
    ) -> Result<UserView, AppError> {
        let avatar: MediaAsset =
            store_required(self.media.as_ref(), file, MediaKind::Image, "Avatar file is missing")
                .await?
                .into();
        let changes = UserChanges {
            avatar: Some(avatar),
            ..Default::default()
        };
        let updated = self.apply_media_change(user, changes).await?;
        discard(self.media.as_ref(), &user.avatar, MediaKind::Image).await;
        Ok(UserView::from(&updated))
    }

    pub async fn update_cover_image(
        &self,
        user: &User,
        file: Option<StagedFile>,
    ) -> Result<UserView, AppError> {
        let cover: MediaAsset = store_required(
            self.media.as_ref(),
            file,
            MediaKind::Image,
            "Cover image file is missing",
        )
        .await?
        .into();
        let changes = UserChanges {
            cover_image: Some(cover),
            ..Default::default()
        };
        let updated = self.apply_media_change(user, changes).await?;
        if let Some(previous) = &user.cover_image {
            discard(self.media.as_ref(), previous, MediaKind::Image).await;
        }
        Ok(UserView::from(&updated))
    }

    /// Persist a new avatar or cover, dropping the fresh upload if the write fails.
    async fn apply_media_change(&self, user: &User, changes: UserChanges) -> Result<User, AppError> {
        let fresh = changes.avatar.clone().or_else(|| changes.cover_image.clone());
        let result = self.users.update_user(user.id, changes).await;
        match result {
            Ok(Some(updated)) => Ok(updated),
            other => {
                if let Some(fresh) = &fresh {
                    discard(self.media.as_ref(), fresh, MediaKind::Image).await;
                }
                match other {
                    Err(err) => Err(err.into()),
                    _ => Err(AppError::not_found("User not found")),
                }
            }
        }
    }

    pub async fn channel_profile(
        &self,
        username: &str,
        viewer: ObjectId,
    ) -> Result<ChannelProfile, AppError> {
        let username = non_blank(Some(username))
            .map(|u| normalize_username(&u))
            .ok_or_else(|| AppError::bad_request("Username is missing"))?;
        self.users
            .channel_profile(&username, viewer)
            .await?
            .ok_or_else(|| AppError::not_found("Channel does not exist"))
    }

    pub async fn watch_history(&self, user_id: ObjectId) -> Result<Vec<VideoView>, AppError> {
        let user = self
            .users
            .find_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        Ok(self.videos.video_views(&user.watch_history).await?)
    }
}
