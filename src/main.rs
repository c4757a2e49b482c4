//! WardenBot Help Menu - Entry Point

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("WardenBot Help Menu v{}", env!("CARGO_PKG_VERSION"));
        println!();
        println!("Usage: wardenbot-help");
        println!();
        println!("Environment variables:");
        println!("  TELEGRAM_BOT_TOKEN       Telegram bot token (required)");
        println!("  HELP_DB_PATH             Menu state database path (default: help_menus.db)");
        println!("  HELP_IDLE_TIMEOUT_SECS   Idle expiry in seconds (default: 60)");
        println!("  HELP_PAGE_SIZE           Modules per menu page (default: 9)");
        println!("  RUST_LOG                 Log level (default: info)");
        return Ok(());
    }

    let log_level = std::env::var("RUST_LOG")
        .map(|s| match s.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        })
        .unwrap_or(Level::INFO);

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!("WardenBot Help Menu v{}", env!("CARGO_PKG_VERSION"));

    wardenbot_help::telegram::run_bot().await
}
