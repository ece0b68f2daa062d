use crate::builder::Session;
use axum::http::{ header::COOKIE, HeaderMap };
use log::{ debug, info };
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{ Duration, Instant };
use tokio::sync::Mutex;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "curator_session";
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(12 * 60 * 60);
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

pub type SharedSession = Arc<Mutex<Session>>;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// Holds each operator's working state between requests, keyed by cookie.
///
/// Sessions idle for longer than `idle_timeout` are dropped, and the registry
/// never holds more than `max_sessions`; the least recently seen goes first.
#[derive(Clone)]
pub struct SessionRegistry {
    sessions: Arc<Mutex<HashMap<String, Entry>>>,
    default_system_message: String,
    idle_timeout: Duration,
    max_sessions: usize,
}

pub struct ResolvedSession {
    pub id: String,
    pub session: SharedSession,
    pub created: bool,
}

impl ResolvedSession {
    /// `Set-Cookie` value to send back when the session was just created.
    pub fn set_cookie(&self) -> Option<String> {
        self.created.then(|| {
            format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, self.id)
        })
    }
}

impl SessionRegistry {
    pub fn new(default_system_message: impl Into<String>) -> Self {
        Self::with_limits(default_system_message, DEFAULT_SESSION_IDLE, DEFAULT_MAX_SESSIONS)
    }

    pub fn with_limits(
        default_system_message: impl Into<String>,
        idle_timeout: Duration,
        max_sessions: usize
    ) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            default_system_message: default_system_message.into(),
            idle_timeout,
            max_sessions: max_sessions.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn resolve(&self, headers: &HeaderMap) -> ResolvedSession {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) <= self.idle_timeout);
        if sessions.len() != before {
            debug!("Expired {} idle session(s)", before - sessions.len());
        }

        if let Some(id) = cookie_value(headers, SESSION_COOKIE) {
            if let Some(entry) = sessions.get_mut(&id) {
                entry.last_seen = now;
                return ResolvedSession { id, session: entry.session.clone(), created: false };
            }
        }

        while sessions.len() >= self.max_sessions {
            let oldest = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    sessions.remove(&id);
                    debug!("Evicted session {} to stay under {} sessions", id, self.max_sessions);
                }
                None => break,
            }
        }

        let id = Uuid::new_v4().to_string();
        let session = Arc::new(Mutex::new(Session::new(&self.default_system_message)));
        sessions.insert(id.clone(), Entry { session: session.clone(), last_seen: now });
        info!("Started session {} ({} active)", id, sessions.len());
        ResolvedSession { id, session, created: true }
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let mut kv = pair.trim().splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some(k), Some(v)) if k == name => Some(v.to_string()),
                _ => None,
            }
        })
        .next()
}
