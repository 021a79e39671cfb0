use adboard::graph::{GraphClient, DEFAULT_GRAPH_API_BASE};
use adboard::{load_session, resolve_session_path, router, AppState};
use chrono::Local;
use std::{env, net::SocketAddr, time::Duration};
use tokio::fs;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let session_path = resolve_session_path();
    if let Some(parent) = session_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let session = load_session(&session_path, Local::now().date_naive()).await;

    let base_url =
        env::var("GRAPH_API_BASE").unwrap_or_else(|_| DEFAULT_GRAPH_API_BASE.to_string());
    let access_token = env::var("GRAPH_ACCESS_TOKEN").unwrap_or_default();
    let client = GraphClient::new(base_url, access_token);

    let refetch_delay = env::var("ADBOARD_CREATIVE_REFETCH_MS")
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(5));

    let state = AppState::new(client, session_path, session, refetch_delay);
    let app = router(state);

    let port = env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    info!("listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending().await,
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {}
        _ = terminate => {}
    }
    info!("shutting down");
}
