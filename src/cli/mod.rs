use clap::Parser;

pub const DEFAULT_SYSTEM_MESSAGE: &str = "මගේ නම නවෝදි. මම ඔබට කෙසේද සහය වෙන්නේ?";

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Dataset Store Args ---
    /// Where the dataset file lives (hub, local, memory)
    #[arg(long, env = "STORE_TYPE", default_value = "hub")]
    pub store_type: String,

    /// Repository holding the dataset file (e.g., username/my_dataset)
    #[arg(long, env = "REPO_ID")]
    pub repo_id: String,

    /// Repository type on the hub (model, dataset, space)
    #[arg(long, env = "REPO_TYPE", default_value = "model")]
    pub repo_type: String,

    /// Branch or revision to read from and commit to.
    #[arg(long, env = "REPO_REVISION", default_value = "main")]
    pub revision: String,

    /// Path of the JSONL dataset file inside the repository.
    #[arg(long, env = "DATA_FILENAME", default_value = "data.jsonl")]
    pub data_filename: String,

    /// Access token for the hub. Empty means anonymous access.
    #[arg(long, env = "HF_TOKEN", default_value = "", hide_env_values = true)]
    pub hf_token: String,

    /// Base URL of the hub API.
    #[arg(long, env = "HF_ENDPOINT", default_value = "https://huggingface.co")]
    pub hub_endpoint: String,

    /// Root directory used when STORE_TYPE=local.
    #[arg(long, env = "LOCAL_STORE_ROOT", default_value = "data")]
    pub local_root: String,

    // --- Form Args ---
    /// System message a new session starts with.
    #[arg(long, env = "DEFAULT_SYSTEM_MESSAGE", default_value = DEFAULT_SYSTEM_MESSAGE)]
    pub default_system_message: String,

    /// Number of most recent records shown on the manage view.
    #[arg(long, env = "DISPLAY_WINDOW", default_value = "10")]
    pub display_window: usize,

    /// Minutes a form session may sit idle before it is discarded.
    #[arg(long, env = "SESSION_IDLE_MINUTES", default_value = "720")]
    pub session_idle_minutes: u64,

    /// Most form sessions kept at once; the least recently used is dropped first.
    #[arg(long, env = "MAX_SESSIONS", default_value = "1000")]
    pub max_sessions: usize,

    // --- General App Args ---
    /// Enable debug logging/output
    #[arg(long, env = "DEBUG", default_value = "false")]
    pub debug: bool,

    /// Host address and port for the server to listen on.
    #[arg(long, env = "SERVER_ADDR", default_value = "127.0.0.1:8501")]
    pub server_addr: String,

    /// Optional path to the TLS certificate file (PEM format) for enabling HTTPS. Requires --tls-key-path.
    #[arg(long, env = "TLS_CERT_PATH")]
    pub tls_cert_path: Option<String>,

    /// Optional path to the TLS private key file (PEM format) for enabling HTTPS. Requires --tls-cert-path.
    #[arg(long, env = "TLS_KEY_PATH")]
    pub tls_key_path: Option<String>,

    #[arg(long, env = "ENABLE_TLS", default_value = "false")]
    pub enable_tls: bool,
}
