use anyhow::Context;
use bookshelf_kernel::{settings::Settings, InitCtx, ModuleRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;

    bookshelf_telemetry::init(&settings.telemetry).context("failed to initialize telemetry")?;

    tracing::info!(
        env = ?settings.environment,
        backend = ?settings.database.backend,
        database = %settings.database.name,
        url_configured = settings.database.url_is_set(),
        "bookshelf bootstrap starting"
    );

    let store = bookshelf_db::connect(&settings.database.connect_options())
        .await
        .context("failed to open document store")?;

    let mut registry = ModuleRegistry::new();
    bookshelf::modules::register_all(&mut registry, &store);

    let ctx = InitCtx {
        settings: &settings,
        store: &store,
    };
    registry.init_modules(&ctx).await?;
    registry.start_modules(&ctx).await?;

    tracing::info!("bookshelf bootstrap complete");

    let served = bookshelf_http::start_server(&registry, &settings, store.clone()).await;

    registry.stop_modules().await?;
    served
}
