//! Bookshop application library
//!
//! Hosts the application modules and the bootstrap shared by the binaries.

pub mod modules;

use anyhow::Context;
use bookshop_kernel::{settings::Settings, InitCtx, ModuleRegistry};

/// Build a registry holding every application module
pub fn build_registry(settings: &Settings) -> ModuleRegistry {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings);
    registry
}

/// Initialize and start all modules, serve HTTP until shutdown, then stop modules.
///
/// Telemetry is expected to be installed by the caller.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    tracing::info!(
        env = ?settings.environment,
        port = settings.server.port,
        "bookshop bootstrap starting"
    );

    let registry = build_registry(&settings);
    let ctx = InitCtx {
        settings: &settings,
    };

    registry
        .init_all(&ctx)
        .await
        .context("module initialization failed")?;
    registry
        .start_all(&ctx)
        .await
        .context("module start failed")?;

    tracing::info!("bookshop bootstrap complete");

    let served = bookshop_http::start_server(&registry, &settings).await;

    registry
        .stop_all()
        .await
        .context("module shutdown failed")?;

    served
}
