use actix_web::{middleware, web, App, HttpServer};
use clap::Parser;

use webhook_relay::config::{Cli, RelayConfig};
use webhook_relay::server::{config_routes, log_request};
use webhook_relay::util::{init_tracing, load_env_file, AppState};

fn fatal(err: impl std::fmt::Display) -> ! {
    tracing::error!("ERROR: {}", err);
    eprintln!("ERROR: {err}");
    std::process::exit(1);
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let env_source = load_env_file();
    init_tracing();
    tracing::info!(
        "Environment loaded from: {}",
        env_source.as_deref().unwrap_or("none")
    );

    let cli = Cli::parse();
    let config = RelayConfig::from_cli(cli).unwrap_or_else(|e| fatal(e));
    let state = AppState::new(config).unwrap_or_else(|e| fatal(e));
    let (host, port) = state.config.bind_addr();
    let target = state.config.target_url_raw.clone();

    let data = web::Data::new(state);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(middleware::from_fn(log_request))
            .configure(config_routes)
    })
    .bind((host.as_str(), port))?;

    tracing::info!("Server is running on port {}", port);
    tracing::info!("Target server: {}", target);
    tracing::info!("Webhook endpoint: http://localhost:{}/api/webhook", port);

    server.run().await?;
    Ok(())
}
