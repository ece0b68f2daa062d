pub mod api;
mod forms;
mod pages;
mod session;

pub use session::{ SessionRegistry, SESSION_COOKIE };

use crate::cli::Args;
use crate::editor::DatasetEditor;
use axum::{
    response::Redirect,
    routing::{ get, post },
    Router,
};
use log::{ error, info };
use std::error::Error;
use std::net::SocketAddr;
use tower_http::cors::{ Any, CorsLayer };

#[derive(Clone)]
pub struct AppState {
    pub editor: DatasetEditor,
    pub sessions: SessionRegistry,
    pub window: usize,
    pub repo_label: String,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::<AppState>::new()
        .route("/recent", get(api::recent_handler))
        .route("/recent/delete", post(api::delete_handler))
        .route("/conversations", post(api::append_handler))
        .layer(cors);

    Router::new()
        .route("/", get(|| async { Redirect::to("/create") }))
        .route("/create", get(forms::create_form).post(forms::submit_create))
        .route("/manage", get(forms::manage_view))
        .route("/manage/delete", post(forms::submit_delete))
        .nest("/api", api)
        .with_state(state)
}

pub struct Server {
    addr: String,
    state: AppState,
    args: Args,
}

impl Server {
    pub fn new(addr: String, state: AppState, args: Args) -> Self {
        Self { addr, state, args }
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let addr = self.addr.parse::<SocketAddr>()?;
        let app = router(self.state);

        if self.args.enable_tls {
            let (cert_path, key_path) = match (&self.args.tls_cert_path, &self.args.tls_key_path) {
                (Some(cert), Some(key)) => (cert, key),
                (Some(_), None) | (None, Some(_)) => {
                    error!("Both --tls-cert-path and --tls-key-path must be provided to enable TLS.");
                    return Err("Missing TLS certificate or key path".into());
                }
                (None, None) => {
                    error!("--enable-tls was set but no certificate/key paths provided.");
                    return Err("TLS enabled without cert/key".into());
                }
            };

            info!("TLS enabled. Loading certificate from '{}' and key from '{}'", cert_path, key_path);
            let tls_config = axum_server::tls_rustls::RustlsConfig
                ::from_pem_file(cert_path, key_path).await?;

            info!("HTTPS server listening on: https://{}", addr);
            axum_server::bind_rustls(addr, tls_config).serve(app.into_make_service()).await?;
        } else {
            let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
                error!("Failed to bind HTTP server to {}: {}. Try a different port.", addr, e);
                e
            })?;
            info!("HTTP server listening on: http://{}", addr);
            axum::serve(listener, app.into_make_service()).await?;
        }

        Ok(())
    }
}
