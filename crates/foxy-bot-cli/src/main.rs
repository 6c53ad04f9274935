use foxy_bot_cli::run_cli;

#[tokio::main]
async fn main() {
    if let Err(e) = run_cli().await {
        eprintln!("foxy-bot: {e}");
        std::process::exit(e.exit_code());
    }
}
