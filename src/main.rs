use std::io;

use paper_summarizer::{
    config::{check_api_key, Config},
    error::AppError,
    llm::OpenAiClient,
    render::render,
    scraper::HttpFetcher,
    Pipeline,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = Config::load()?;

    // The key check is advisory; a bad key only fails once the service is called.
    match check_api_key(config.api_key.as_deref()) {
        Ok(()) => info!("API key found and looks good so far"),
        Err(err) => warn!("{}", err),
    }

    let url = std::env::args()
        .nth(1)
        .or_else(|| config.paper_url.clone())
        .ok_or_else(|| {
            AppError::ConfigError("No paper URL given; pass it as the first argument or set PAPER_URL".to_string())
        })?;

    let pipeline = Pipeline::new(HttpFetcher::new()?, OpenAiClient::new(&config)?);

    info!(%url, model = %config.model, "summarizing paper");
    let summary = pipeline.summarize(&url)?;

    render(&summary, config.output, io::stdout().lock())?;
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("paper_summarizer=info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}
