mod api;
mod trace;

#[cfg(test)]
mod tests;

use anyhow::Context;
use libtermbridge::prelude::*;
use tokio::signal;

use crate::api::config::Config;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  let config = Config::from_env()?;
  let _guards = trace::init_tracing(&config, std::io::stdout());
  let store = SqliteStore::open(&config.database_path).context("could not open database")?;

  run(config, store).await
}

async fn run<S: Store>(config: Config, store: S) -> anyhow::Result<()> {
  let app = api::routes(&config, store).await?;
  let listener = tokio::net::TcpListener::bind(&config.listen_addr).await.context("could not create listener")?;

  tracing::info!(termbridge = env!("CARGO_PKG_VERSION"), "listening on {}", listener.local_addr()?.to_string());

  axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>())
    .with_graceful_shutdown(shutdown())
    .await
    .context("could not start app")?;

  Ok(())
}

async fn shutdown() {
  let ctrl_c = async {
    if let Err(err) = signal::ctrl_c().await {
      tracing::error!(error = err.to_string(), "failed to install ^C handler");
      std::future::pending::<()>().await;
    }
  };

  let terminate = async {
    match signal::unix::signal(signal::unix::SignalKind::terminate()) {
      Ok(mut stream) => {
        stream.recv().await;
      }

      Err(err) => {
        tracing::error!(error = err.to_string(), "failed to install terminate signal handler");
        std::future::pending::<()>().await;
      }
    }
  };

  tokio::select! {
      () = ctrl_c => tracing::info!("received ^C, initiating shutdown"),
      () = terminate => tracing::info!("received terminate signal, initiating shutdown"),
  }
}
