use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{
    extractors::Identity,
    jwt::JwtKeys,
    password::Password,
    repo_types::User,
    reset_repo::PasswordResetToken,
    tokens::{generate_secret, hash_secret},
};
use crate::{
    error::{AppError, AppResult},
    mailer::{Email, Recipient},
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 72;
const MAX_USERNAME_LEN: usize = 100;
const MAX_EMAIL_LEN: usize = 255;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims and lower-cases, then checks the basic shape.
pub fn normalize_email(email: &str) -> AppResult<String> {
    let email = email.trim().to_lowercase();
    if email.len() > MAX_EMAIL_LEN || !is_valid_email(&email) {
        return Err(AppError::validation("invalid email"));
    }
    Ok(email)
}

pub fn validate_password(plain: &str) -> AppResult<()> {
    let len = plain.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AppError::validation("password too short"));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AppError::validation("password too long"));
    }
    Ok(())
}

fn normalize_username(username: &str) -> AppResult<String> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::validation("username is required"));
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::validation("username too long"));
    }
    Ok(username.to_string())
}

fn human_window(minutes: i64) -> String {
    match minutes {
        60 => "1 hour".to_string(),
        m if m > 60 && m % 60 == 0 => format!("{} hours", m / 60),
        1 => "1 minute".to_string(),
        m => format!("{m} minutes"),
    }
}

fn link(base: &str, path: &str, secret: &str) -> String {
    format!("{}/{}/{}", base.trim_end_matches('/'), path, secret)
}

/// Result of a successful registration. The secret is shown once and must be
/// delivered out of band; only its hash is stored.
#[derive(Debug)]
pub struct Registration {
    pub user: User,
    pub invitation_secret: String,
}

/// Creates a pending account and mails its invitation.
///
/// Delivery failure deletes the account again and fails the call, so a
/// registration either exists with a sent invitation or not at all.
#[instrument(skip(state, password))]
pub async fn register(
    state: &AppState,
    username: &str,
    email: &str,
    password: &str,
) -> AppResult<Registration> {
    let username = normalize_username(username)?;
    let email = normalize_email(email)?;
    validate_password(password)?;

    let password = Password::set(password)?;
    let secret = generate_secret()?;
    let expiry =
        OffsetDateTime::now_utc() + TimeDuration::hours(state.config.invitation_ttl_hours);

    let user = User::create_and_invite(
        &state.db,
        &username,
        &email,
        password.hash(),
        &hash_secret(&secret),
        expiry,
    )
    .await?;

    let recipient = Recipient {
        name: user.username.clone(),
        email: user.email.clone(),
    };
    let mail = Email::Invitation {
        username: user.username.clone(),
        activation_url: link(&state.config.frontend_url, "confirm", &secret),
    };

    if let Err(e) = state.mailer.send(&recipient, &mail).await {
        error!(error = ?e, user_id = user.id, "error sending welcome email");
        if let Err(del) = User::delete(&state.db, user.id).await {
            error!(error = %del, user_id = user.id, "error deleting user after failed welcome email");
        }
        return Err(AppError::Internal(e.context("welcome email delivery failed")));
    }

    info!(user_id = user.id, public_id = %user.public_id, "user registered");
    Ok(Registration {
        user,
        invitation_secret: secret,
    })
}

/// Unknown, expired and already used secrets all fail with `NotFound`.
#[instrument(skip_all)]
pub async fn activate(state: &AppState, secret: &str) -> AppResult<()> {
    let user_id = User::activate(&state.db, &hash_secret(secret), OffsetDateTime::now_utc()).await?;
    info!(user_id, "user activated");
    Ok(())
}

/// Password is checked before activation state so a wrong password never
/// reveals whether the account is pending.
#[instrument(skip(state, password))]
pub async fn issue_auth_token(
    state: &AppState,
    email: &str,
    password: &str,
) -> AppResult<(String, User)> {
    let email = normalize_email(email).map_err(|_| AppError::InvalidCredentials)?;

    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        warn!("login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !user.password().matches(password) {
        warn!(user_id = user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    if !user.is_active {
        warn!(user_id = user.id, "login on pending account");
        return Err(AppError::AccountNotActive);
    }

    let token = JwtKeys::new(&state.config.jwt).sign(user.public_id)?;
    info!(user_id = user.id, "auth token issued");
    Ok((token, user))
}

pub fn verify_auth_token(keys: &JwtKeys, token: &str) -> AppResult<Uuid> {
    keys.verify(token)
}

/// Looks up the subject of a verified token. Fails with `NotFound` if the
/// account was removed after the token was issued.
pub async fn resolve_by_token(state: &AppState, subject: Uuid) -> AppResult<User> {
    User::find_by_public_id(&state.db, subject)
        .await?
        .ok_or(AppError::NotFound)
}

/// Authorization gate: a structurally valid token whose subject is gone or
/// not active is treated as unauthenticated.
pub async fn resolve_identity(state: &AppState, subject: Uuid) -> AppResult<Identity> {
    match resolve_by_token(state, subject).await {
        Ok(user) if user.is_active => Ok(Identity::from(&user)),
        Ok(_) | Err(AppError::NotFound) => {
            warn!(subject = %subject, "token subject does not resolve to an active user");
            Err(AppError::InvalidToken)
        }
        Err(e) => Err(e),
    }
}

/// Observable outcome is identical whether or not the email is registered,
/// and whether or not the mail went out.
#[instrument(skip_all)]
pub async fn request_password_reset(state: &AppState, email: &str) -> AppResult<()> {
    let email = normalize_email(email)?;

    let user = match User::find_by_email(&state.db, &email).await {
        Ok(Some(user)) => user,
        Ok(None) => return Ok(()),
        Err(e) => {
            error!(error = %e, "password reset lookup failed");
            return Ok(());
        }
    };

    if let Err(e) = issue_password_reset(state, &user).await {
        error!(error = ?e, user_id = user.id, "error issuing password reset");
    }
    Ok(())
}

async fn issue_password_reset(state: &AppState, user: &User) -> anyhow::Result<()> {
    let secret = generate_secret()?;
    let expiry =
        OffsetDateTime::now_utc() + TimeDuration::minutes(state.config.reset_ttl_minutes);
    PasswordResetToken::create(&state.db, user.id, &hash_secret(&secret), expiry)
        .await
        .context("store password reset token")?;

    let recipient = Recipient {
        name: user.username.clone(),
        email: user.email.clone(),
    };
    let mail = Email::PasswordReset {
        username: user.username.clone(),
        reset_url: link(&state.config.frontend_url, "reset-password", &secret),
        expiry: human_window(state.config.reset_ttl_minutes),
    };
    state
        .mailer
        .send(&recipient, &mail)
        .await
        .context("send password reset email")?;
    info!(user_id = user.id, "password reset issued");
    Ok(())
}

/// Unknown, expired and already used secrets all fail with `NotFound`.
#[instrument(skip_all)]
pub async fn consume_password_reset(
    state: &AppState,
    secret: &str,
    new_password: &str,
) -> AppResult<()> {
    validate_password(new_password)?;
    let password = Password::set(new_password)?;
    let user_id = PasswordResetToken::consume(
        &state.db,
        &hash_secret(secret),
        OffsetDateTime::now_utc(),
        password.hash(),
    )
    .await?;
    info!(user_id, "password reset consumed");
    Ok(())
}

pub async fn get_me(state: &AppState, identity: &Identity) -> AppResult<User> {
    User::find_by_id(&state.db, identity.user_id)
        .await?
        .ok_or(AppError::NotFound)
}

async fn reauthenticate(state: &AppState, identity: &Identity, current: &str) -> AppResult<User> {
    let user = get_me(state, identity).await?;
    if !user.password().matches(current) {
        warn!(user_id = user.id, "current password mismatch");
        return Err(AppError::InvalidCredentials);
    }
    Ok(user)
}

#[instrument(skip(state, current_password), fields(user_id = identity.user_id))]
pub async fn update_email(
    state: &AppState,
    identity: &Identity,
    new_email: &str,
    current_password: &str,
) -> AppResult<User> {
    let new_email = normalize_email(new_email)?;
    let user = reauthenticate(state, identity, current_password).await?;
    let updated = User::update_email(&state.db, user.id, &new_email).await?;
    info!(user_id = user.id, "email updated");
    Ok(updated)
}

#[instrument(skip_all, fields(user_id = identity.user_id))]
pub async fn update_password(
    state: &AppState,
    identity: &Identity,
    current_password: &str,
    new_password: &str,
) -> AppResult<()> {
    validate_password(new_password)?;
    let user = reauthenticate(state, identity, current_password).await?;
    let password = Password::set(new_password)?;
    User::update_password(&state.db, user.id, password.hash()).await?;
    info!(user_id = user.id, "password updated");
    Ok(())
}
