use anyhow::Result;
use clap::Parser;
use fallback_webhook::{telemetry, Args, WebhookConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the real environment still applies.
    let dotenv = dotenvy::dotenv();

    let args = Args::parse();
    telemetry::init_tracing(args.log_format);
    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "Loaded environment file");
    }

    let config = WebhookConfig::from_args(args)?;
    fallback_webhook::run(config).await
}
