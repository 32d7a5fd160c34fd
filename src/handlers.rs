use crate::config::Config;
use crate::db::DbPool;
use crate::error::{ApiError, AppError};
use crate::models::*;
use crate::pages;
use crate::session;
use crate::store::{MessageStore, UserStore, API_LIMIT, VIEW_LIMIT};
use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::get,
    Form, Json, Router,
};
use axum_extra::extract::cookie::{Key, SignedCookieJar};
use chrono::Utc;
use tower_http::trace::TraceLayer;

/// Everything a handler needs, passed through axum state instead of ambient
/// globals.
#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub messages: MessageStore,
    key: Key,
}

impl AppState {
    pub fn new(pool: DbPool, config: &Config) -> AppState {
        AppState {
            users: UserStore::new(pool.clone(), config.users_table.clone()),
            messages: MessageStore::new(pool, config.messages_table.clone()),
            key: Key::derive_from(config.session_secret.as_bytes()),
        }
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.key.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/login", get(login_form).post(login_submit))
        .route("/welcome", get(welcome))
        .route("/chat/:other_user", get(chat_view).post(chat_send))
        .route("/logout", get(logout))
        .route("/health", get(health))
        .route("/users", get(list_users))
        .route("/messages/:user1/:user2", get(conversation_messages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(jar: SignedCookieJar) -> Redirect {
    match session::current_user(&jar) {
        Some(_) => Redirect::to("/welcome"),
        None => Redirect::to("/login"),
    }
}

async fn login_form() -> Html<String> {
    Html(pages::login_page(None))
}

async fn login_submit(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim().to_lowercase();
    if username.is_empty() {
        return Html(pages::login_page(Some("Username is required"))).into_response();
    }

    match state.users.get_or_create(&username).await {
        Ok(user) => {
            tracing::info!(username = %user.username, "user logged in");
            let jar = session::sign_in(jar, &user.username);
            (jar, Redirect::to("/welcome")).into_response()
        }
        Err(e) => {
            tracing::error!(username = %username, "login failed: {}", e);
            Html(pages::login_page(Some(&format!("Error: {}", e)))).into_response()
        }
    }
}

async fn welcome(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> Result<Response, AppError> {
    let Some(current_user) = session::current_user(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };

    let users = state.users.list_all().await?;
    Ok(Html(pages::welcome_page(&users, &current_user)).into_response())
}

async fn chat_view(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(other_user): Path<String>,
) -> Result<Response, AppError> {
    let Some(current_user) = session::current_user(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };
    if current_user == other_user {
        return Ok(Redirect::to("/welcome").into_response());
    }
    if state.users.find(&other_user).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let messages = state
        .messages
        .fetch_recent(&current_user, &other_user, VIEW_LIMIT)
        .await?;
    Ok(Html(pages::chat_page(&messages, &current_user, &other_user, None)).into_response())
}

async fn chat_send(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Path(other_user): Path<String>,
    Form(form): Form<MessageForm>,
) -> Result<Response, AppError> {
    let Some(current_user) = session::current_user(&jar) else {
        return Ok(Redirect::to("/login").into_response());
    };
    if current_user == other_user {
        return Ok(Redirect::to("/welcome").into_response());
    }
    if state.users.find(&other_user).await?.is_none() {
        return Err(AppError::NotFound);
    }

    let text = form.message.trim();
    if text.is_empty() {
        let messages = state
            .messages
            .fetch_recent(&current_user, &other_user, VIEW_LIMIT)
            .await?;
        return Ok(Html(pages::chat_page(
            &messages,
            &current_user,
            &other_user,
            Some("Message cannot be empty"),
        ))
        .into_response());
    }

    state.messages.append(&current_user, &other_user, text).await?;
    Ok(Redirect::to(&format!("/chat/{}", other_user)).into_response())
}

async fn logout(jar: SignedCookieJar) -> impl IntoResponse {
    (session::sign_out(jar), Redirect::to("/login"))
}

async fn health(State(state): State<AppState>) -> Response {
    let probe = async {
        state.users.ping().await?;
        state.messages.ping().await
    };
    match probe.await {
        Ok(()) => Json(HealthResponse {
            status: "OK".to_string(),
            timestamp: Utc::now(),
        })
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(HealthErrorResponse {
                status: "ERROR".to_string(),
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn list_users(State(state): State<AppState>) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.users.list_all().await?;
    Ok(Json(UsersResponse { users }))
}

/// JSON variant of the chat view. Note: newest first and a wider window, the
/// opposite ordering from the HTML page.
async fn conversation_messages(
    State(state): State<AppState>,
    Path((user1, user2)): Path<(String, String)>,
) -> Result<Json<MessagesResponse>, ApiError> {
    let messages = state.messages.fetch_latest(&user1, &user2, API_LIMIT).await?;
    Ok(Json(MessagesResponse { messages }))
}
