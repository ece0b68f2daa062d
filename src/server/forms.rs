use super::pages;
use super::session::ResolvedSession;
use super::AppState;
use crate::builder::{ Notice, Session };
use crate::editor::EditorError;
use crate::models::chat::Role;
use axum::{
    extract::State,
    http::{ header::SET_COOKIE, HeaderMap, HeaderValue },
    response::{ Html, IntoResponse, Redirect, Response },
    Form,
};
use log::{ error, warn };

const INELIGIBLE_WARNING: &str =
    "Please create a conversation with at least one user-assistant exchange before adding to the dataset.";
const UPDATED: &str = "Dataset updated successfully!";

/// One submission of the create form: field edits plus the button pressed.
#[derive(Debug, Default, PartialEq)]
struct CreateSubmission {
    system: Option<String>,
    turns: Vec<(usize, Role, String)>,
    action: Option<String>,
}

impl CreateSubmission {
    fn parse(fields: Vec<(String, String)>) -> Self {
        let mut submission = Self::default();
        for (name, value) in fields {
            match name.as_str() {
                "system" => submission.system = Some(value),
                "action" => submission.action = Some(value),
                _ => {
                    if let Some((role, pair)) = parse_turn_field(&name) {
                        submission.turns.push((pair, role, value));
                    }
                }
            }
        }
        // Pairs are written in order so padding never trips the out-of-order check.
        submission.turns.sort_by_key(|(pair, role, _)| (*pair, *role == Role::Assistant));
        submission
    }
}

fn parse_turn_field(name: &str) -> Option<(Role, usize)> {
    let (prefix, pair) = name.split_once('_')?;
    let role = match prefix {
        "user" => Role::User,
        "assistant" => Role::Assistant,
        _ => {
            return None;
        }
    };
    pair.parse().ok().map(|p| (role, p))
}

fn with_cookie(mut response: Response, resolved: &ResolvedSession) -> Response {
    if let Some(cookie) = resolved.set_cookie() {
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}

fn apply_edits(session: &mut Session, submission: &CreateSubmission) {
    if let Some(system) = &submission.system {
        session.builder.set_system_message(system);
    }
    for (pair, role, text) in &submission.turns {
        if let Err(e) = session.builder.set_turn(*pair, *role, text) {
            warn!("Ignoring field for pair {}: {}", pair, e);
            session.notify(Notice::error(e.to_string()));
        }
    }
}

pub async fn create_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let resolved = state.sessions.resolve(&headers).await;
    let html = {
        let mut session = resolved.session.lock().await;
        let notices = session.take_notices();
        pages::create_page(&state.repo_label, &session, &notices)
    };
    with_cookie(Html(html).into_response(), &resolved)
}

pub async fn submit_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>
) -> Response {
    let resolved = state.sessions.resolve(&headers).await;
    let submission = CreateSubmission::parse(fields);

    {
        let mut session = resolved.session.lock().await;
        apply_edits(&mut session, &submission);

        match submission.action.as_deref() {
            Some("add_pair") => session.builder.add_pair(),
            Some("clear") => session.builder.clear(),
            Some("commit") => {
                match state.editor.commit(&mut session).await {
                    Ok(_) => session.notify(Notice::success(UPDATED)),
                    Err(EditorError::IneligibleRecord) => {
                        session.notify(Notice::warning(INELIGIBLE_WARNING));
                    }
                    Err(e) => {
                        error!("Failed to add conversation: {}", e);
                        session.notify(Notice::error(e.to_string()));
                    }
                }
            }
            _ => {}
        }
    }

    with_cookie(Redirect::to("/create").into_response(), &resolved)
}

pub async fn manage_view(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let resolved = state.sessions.resolve(&headers).await;
    let mut session = resolved.session.lock().await;

    let window = match state.editor.list_recent(state.window).await {
        Ok(window) => {
            if let Some(warning) = &window.warning {
                session.notify(Notice::warning(warning.clone()));
            }
            Some(window)
        }
        Err(e) => {
            error!("Failed to load dataset: {}", e);
            session.notify(Notice::error(e.to_string()));
            None
        }
    };

    let notices = session.take_notices();
    drop(session);
    let html = pages::manage_page(&state.repo_label, window.as_ref(), state.window, &notices);
    with_cookie(Html(html).into_response(), &resolved)
}

pub async fn submit_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(fields): Form<Vec<(String, String)>>
) -> Response {
    let resolved = state.sessions.resolve(&headers).await;
    let mut session = resolved.session.lock().await;

    let parsed: Result<Vec<usize>, _> = fields
        .iter()
        .filter(|(name, _)| name == "row")
        .map(|(_, value)| value.parse::<usize>())
        .collect();

    match parsed {
        Ok(indices) if indices.is_empty() => {
            session.notify(Notice::warning("No rows selected."));
        }
        Ok(indices) => {
            match state.editor.delete(&indices, state.window).await {
                Ok(_) => session.notify(Notice::success(UPDATED)),
                Err(e) => {
                    error!("Failed to delete rows {:?}: {}", indices, e);
                    session.notify(Notice::error(e.to_string()));
                }
            }
        }
        Err(e) => session.notify(Notice::error(format!("Invalid row selection: {}", e))),
    }

    drop(session);
    with_cookie(Redirect::to("/manage").into_response(), &resolved)
}
