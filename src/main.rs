use anyhow::Context;
use bookshop_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load bookshop settings")?;

    bookshop_telemetry::init(&settings.telemetry)?;

    bookshop_app::run(settings).await
}
