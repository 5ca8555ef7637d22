use clap::{Parser, Subcommand};
use tictactoe_server::ServerConfig;
use tracing_subscriber::EnvFilter;

mod client;

#[derive(Parser)]
#[command(name = "tictactoe")]
#[command(about = "Two-player tic-tac-toe - relay server and terminal client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the relay server
    Server(ServerConfig),
    /// Play from this terminal
    Client {
        /// Websocket endpoint of the server
        #[arg(short, long, default_value = client::DEFAULT_URL)]
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Server(config) => {
            tictactoe_server::init_tracing();
            tictactoe_server::run(config).await
        }
        Commands::Client { url } => {
            init_client_tracing();
            client::run(&url).await
        }
    }
}

/// The board owns stdout, so client logs go to stderr and default to `warn`.
fn init_client_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
