use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use clinic_cli::config_from_env;
use clinic_cli::menu::Menu;
use clinic_core::{Clinic, CoreConfig, EntityStore, StoreBackend};

/// Main entry point for the clinic application
///
/// Runs the interactive text menu on stdin/stdout against the configured store.
/// Logs go to stderr so they do not interleave with menu output.
///
/// # Environment Variables
/// - `CLINIC_DATA_DIR`: Directory for the file store (default: "clinic_data")
/// - `CLINIC_STORE`: Store backend, `file` or `memory` (default: "file")
/// - `RUST_LOG`: Additional tracing filter directives
///
/// # Returns
/// * `Ok(())` - When the user exits the menu or input ends
/// * `Err(anyhow::Error)` - If configuration, store startup or terminal I/O fails
fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinic=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = config_from_env()?;
    tracing::info!(
        "++ Starting clinic with {} store at {}",
        config.backend(),
        config.data_dir().display()
    );

    match config.backend() {
        StoreBackend::File => run(Clinic::new(Arc::new(config.open_file_store()?)), &config),
        StoreBackend::Memory => run(Clinic::new(Arc::new(config.open_memory_store())), &config),
    }
}

fn run<S: EntityStore>(clinic: Clinic<S>, config: &CoreConfig) -> anyhow::Result<()> {
    let stdin = std::io::stdin();
    Menu::new(&clinic, stdin.lock(), std::io::stdout()).run()?;

    tracing::info!("-- Clinic menu closed ({} store)", config.backend());
    Ok(())
}
