use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use financial_analyzer::{
    analyzer::Analyzer,
    cache::CacheStore,
    config::SETTINGS,
    crawler::{HttpTransport, StatementClient},
    logging, util, web,
};

#[cfg(all(target_os = "linux", target_env = "musl"))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    util::http::init_client(SETTINGS.api.timeout())?;

    let cache = CacheStore::new(SETTINGS.cache_dir());
    let client = StatementClient::from_config(Arc::new(HttpTransport), cache, &SETTINGS.api);
    let analyzer = Analyzer::new(client)
        .with_thresholds(SETTINGS.insight.clone())
        .with_growth_basis(SETTINGS.analysis.growth_basis);

    let addr = SocketAddr::from(([0, 0, 0, 0], SETTINGS.server.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    let msg = format!(
        "financial_analyzer listening on {} with cache {}",
        addr, SETTINGS.cache.dir
    );
    logging::info_console(msg.clone());
    logging::info_file_async(msg);

    axum::serve(listener, web::build_router(Arc::new(analyzer)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(why) = tokio::signal::ctrl_c().await {
        logging::error_console(format!("Failed to listen for ctrl_c because {:?}", why));
    }
    logging::info_console("shutting down".to_string());
}
