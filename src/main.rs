use anyhow::Result;
use clap::Parser;
use mero_calls::{create_router, AppState, Config, NatsChatCompletion, SyntheticMediaSource};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "mero-calls", about = "Peer-to-peer video call rooms")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/mero-calls")]
    config: String,

    /// Override the HTTP port from the config file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("Mero Calls v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded config: {}", cfg.service.name);

    let mut state = AppState::new(cfg.call.clone(), Arc::new(SyntheticMediaSource::new()));

    if cfg.chat.enabled {
        let completion = NatsChatCompletion::connect(
            &cfg.chat.nats_url,
            cfg.chat.subject.clone(),
            cfg.chat.timeout(),
        )
        .await;
        match completion {
            Ok(completion) => {
                info!("Support chat enabled via {}", cfg.chat.nats_url);
                state = state.with_chat(Arc::new(completion));
            }
            Err(e) => warn!("Support chat unavailable: {}", e),
        }
    } else {
        info!("Support chat disabled");
    }

    let app = create_router(state).layer(CorsLayer::permissive());

    let port = args.port.unwrap_or(cfg.service.http.port);
    let addr = format!("{}:{}", cfg.service.http.bind, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
