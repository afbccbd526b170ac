//! pricegate: agent-facing campaign pricing gate.
//! Single-process binary embedding the session server, event log,
//! notification dispatcher, and campaign admin commands.

use clap::Parser;

mod cli;
mod client;
mod cmd_campaign;
mod invoker;
mod notify;
mod protocol;
mod server;
mod session;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    match args.command {
        cli::Command::Serve => {
            let filter = std::env::var("PRICEGATE_LOG")
                .or_else(|_| std::env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string());
            tracing_subscriber::fmt()
                .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
                .init();

            tracing::info!("pricegate daemon starting");

            let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);
            server::run_daemon(&args.data_dir, &socket_path).await?;
        }
        cli::Command::Call(opts) => {
            let socket_path = args.socket_path.unwrap_or_else(cli::default_socket_path);
            client::cmd_call(&socket_path, &opts).await?;
        }
        cli::Command::Campaign(cmd) => {
            cmd_campaign::run(&args.data_dir, cmd)?;
        }
    }

    Ok(())
}
