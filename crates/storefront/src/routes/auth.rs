//! Authentication route handlers.
//!
//! Handles login, registration, and logout. Failed form submissions
//! re-render the form with a message; storage failures propagate as
//! server errors.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::{clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub name: Option<String>,
    pub password: String,
    pub password_confirm: String,
}

/// Query parameters for message display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(Query(query): Query<MessageQuery>) -> LoginTemplate {
    LoginTemplate {
        error: query.error,
        success: query.success,
    }
}

/// Handle login form submission.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let service = AuthService::new(state.pool());

    match service.login(&form.email, &form.password).await {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email,
            };
            set_current_user(&session, &current)
                .await
                .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

            Ok(Redirect::to("/").into_response())
        }
        Err(err @ (AuthError::Repository(_) | AuthError::PasswordHash)) => {
            Err(AppError::Auth(err))
        }
        Err(_) => Ok(LoginTemplate {
            // One message for every credential failure; don't reveal
            // whether the account exists
            error: Some("Invalid email or password.".to_string()),
            success: None,
        }
        .into_response()),
    }
}

/// Display the registration page.
pub async fn register_page() -> RegisterTemplate {
    RegisterTemplate { error: None }
}

/// Handle registration form submission.
///
/// A successful registration logs the shopper straight in.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if form.password != form.password_confirm {
        return Ok(RegisterTemplate {
            error: Some("Passwords do not match.".to_string()),
        }
        .into_response());
    }

    let name = form
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty());

    let service = AuthService::new(state.pool());

    match service.register(&form.email, name, &form.password).await {
        Ok(user) => {
            let current = CurrentUser {
                id: user.id,
                email: user.email,
            };
            set_current_user(&session, &current)
                .await
                .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

            Ok(Redirect::to("/").into_response())
        }
        Err(err @ (AuthError::Repository(_) | AuthError::PasswordHash)) => {
            Err(AppError::Auth(err))
        }
        Err(err) => Ok(RegisterTemplate {
            error: Some(register_error_message(&err)),
        }
        .into_response()),
    }
}

/// Handle logout: drop the whole session.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Redirect> {
    clear_current_user(&session)
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("session error: {e}")))?;

    Ok(Redirect::to("/auth/login?success=Signed+out."))
}

/// User-facing message for a failed registration.
fn register_error_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidEmail(_) => "Please enter a valid email address.".to_string(),
        AuthError::UserAlreadyExists => {
            "An account with this email already exists.".to_string()
        }
        AuthError::WeakPassword(msg) => format!("{msg}."),
        _ => "Registration failed, please try again.".to_string(),
    }
}
