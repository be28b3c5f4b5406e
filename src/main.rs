use std::env;

use anyhow::Context;

use booking_intake::app;
use booking_intake::settings::Settings;
use booking_intake::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("Failed to load settings")?;

    let subscriber =
        telemetry::create_subscriber(&settings.log, env::var("RUST_LOG").ok(), std::io::stdout)?;
    telemetry::set_subscriber(subscriber)?;

    app::build(&settings)
        .await?
        .await
        .context("Failed to run app")
}
