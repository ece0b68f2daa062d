pub mod builder;
pub mod cli;
pub mod dataset;
pub mod editor;
pub mod models;
pub mod server;
pub mod store;

use cli::Args;
use editor::DatasetEditor;
use log::info;
use server::{ AppState, Server, SessionRegistry };
use std::error::Error;
use std::time::Duration;
use store::{ initialize_remote_store, BlobKey };

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Server Address: {}", args.server_addr);
    info!("Store Type: {}", args.store_type);
    info!("Repository: {} ({})", args.repo_id, args.repo_type);
    info!("Revision: {}", args.revision);
    info!("Dataset File: {}", args.data_filename);
    if args.store_type.eq_ignore_ascii_case("hub") {
        info!("Hub Endpoint: {}", args.hub_endpoint);
        info!("Hub Token: {}", if args.hf_token.is_empty() { "anonymous" } else { "provided" });
    }
    if args.store_type.eq_ignore_ascii_case("local") {
        info!("Local Store Root: {}", args.local_root);
    }
    info!("Display Window: {}", args.display_window);
    info!("Sessions: at most {}, idle limit {} min", args.max_sessions, args.session_idle_minutes);
    info!("TLS Enabled: {}", args.enable_tls);
    info!("-------------------------");

    let store = initialize_remote_store(&args)?;
    let editor = DatasetEditor::new(store, BlobKey::new(&args.repo_id, &args.data_filename));
    let state = AppState {
        editor,
        sessions: SessionRegistry::with_limits(
            &args.default_system_message,
            Duration::from_secs(args.session_idle_minutes.saturating_mul(60)),
            args.max_sessions
        ),
        window: args.display_window,
        repo_label: args.repo_id.clone(),
    };

    let addr = args.server_addr.clone();
    info!("Starting server on: {}", addr);
    let server = Server::new(addr, state, args);
    server.run().await?;

    Ok(())
}
