use anyhow::Result;
use std::sync::Arc;

use gitsync_core::{Endpoint, UpdateCoordinator};
use gitsync_git::GitUpdater;

use crate::cli::Commands;
use crate::settings::Settings;

pub async fn execute(command: Commands, settings: Settings) -> Result<()> {
    let registry = Arc::new(settings.build_registry(Arc::new(GitUpdater::new()))?);
    let coordinator = UpdateCoordinator::new(registry).with_lock_timeout(settings.lock_timeout());

    match command {
        Commands::Serve { listen } => {
            let endpoints = provision_endpoints(&settings)?;
            for endpoint in &endpoints {
                tracing::info!(
                    instance_name = %endpoint.name(),
                    path = %endpoint.path(),
                    "serving endpoint"
                );
            }

            let state = gitsync_api::ApiState { coordinator };
            let app = gitsync_api::create_router(state, endpoints);

            let addr = listen.unwrap_or_else(|| settings.server.listen.clone());
            tracing::info!("GitSync server running on http://{}", addr);

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            tracing::info!("GitSync server stopped");
        }

        Commands::Check => {
            let endpoints = provision_endpoints(&settings)?;

            println!("Configuration OK\n");
            println!("Repositories:");
            for repo in &settings.repositories {
                println!(
                    "  {} ({} @ {}) -> {} [{} webhook(s)]",
                    repo.name,
                    repo.address,
                    repo.branch,
                    repo.path().display(),
                    repo.webhooks.len()
                );
            }

            println!("\nEndpoints:");
            for endpoint in &endpoints {
                println!("  POST {} -> {}", endpoint.path(), endpoint.repository_name());
            }
        }

        Commands::Update { repository } => {
            println!("Updating {}...", repository);
            coordinator.dispatch(&repository).await?;
            println!("✅ {} is up to date", repository);
        }
    }

    Ok(())
}

/// Run the endpoint lifecycle for every configured endpoint.
fn provision_endpoints(settings: &Settings) -> Result<Vec<Endpoint>> {
    let mut endpoints = settings.endpoints();
    for endpoint in &mut endpoints {
        let span = tracing::info_span!("endpoint", repo_name = %endpoint.repository_name());
        endpoint.set_logger(span);
        endpoint.provision()?;
        endpoint.validate()?;
    }
    Ok(endpoints)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
