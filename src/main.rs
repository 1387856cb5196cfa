use rental_server::{Config, Server, ServerState, init_logger_with_file};

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(Some(&log_level), log_dir.as_deref());

    tracing::info!("Rental server starting...");

    let config = Config::from_env();

    // 启动校验失败（门店覆盖不全等）直接终止进程
    let state = ServerState::initialize(&config)
        .await
        .expect("Failed to initialize server state");

    let server = Server::with_state(config, state);
    if let Err(e) = server.run().await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
