use clap::Parser;
use tictactoe_server::ServerConfig;

#[derive(Parser)]
#[command(name = "tictactoe-server")]
#[command(about = "Two-player tic-tac-toe relay")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tictactoe_server::init_tracing();
    let cli = Cli::parse();
    tictactoe_server::run(cli.config).await
}
