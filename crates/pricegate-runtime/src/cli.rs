//! CLI definition using clap derive.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pricegate", about = "agent-facing campaign pricing gate")]
pub struct Cli {
    /// UDS socket path (default: /tmp/pricegate-$USER/pricegated.sock)
    #[arg(long, short = 's', global = true, env = "PRICEGATE_SOCKET_PATH")]
    pub socket_path: Option<String>,

    /// Directory holding campaign.json and catalog.json
    #[arg(long, global = true, env = "PRICEGATE_DATA_DIR", default_value = "data")]
    pub data_dir: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the daemon (session server + notification dispatcher)
    Serve,
    /// Invoke a tool against a running daemon
    Call(CallOpts),
    /// Manage the current campaign document
    #[command(subcommand)]
    Campaign(CampaignCmd),
}

#[derive(clap::Args)]
pub struct CallOpts {
    /// Tool name: get-products | get-discount
    pub tool: String,

    /// Tool argument as KEY=VALUE (e.g. product_id=42)
    #[arg(long = "arg", value_name = "KEY=VALUE")]
    pub args: Vec<String>,

    /// Request header as NAME:VALUE, used for targeting
    #[arg(long = "header", short = 'H', value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// Resume an existing session instead of starting a new one
    #[arg(long)]
    pub session: Option<String>,

    /// Replay events after this id when resuming
    #[arg(long)]
    pub last_event: Option<String>,

    /// How long to linger for out-of-band notifications, in milliseconds
    #[arg(long, default_value = "500")]
    pub linger_ms: u64,
}

#[derive(Subcommand)]
pub enum CampaignCmd {
    /// Enrich a campaign draft against the catalog and store it
    Set {
        /// Path to the campaign draft JSON file
        file: String,
    },
    /// Print the stored campaign
    Show,
    /// Remove the stored campaign
    Clear,
}

/// Default socket path using $USER for per-user isolation.
pub fn default_socket_path() -> String {
    if let Ok(dir) = std::env::var("XDG_RUNTIME_DIR") {
        return format!("{dir}/pricegate/pricegated.sock");
    }
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".to_string());
    format!("/tmp/pricegate-{user}/pricegated.sock")
}
