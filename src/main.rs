use clap::Parser;
use satzbau::audio::AudioLocator;
use satzbau::config_loader::Settings;
use satzbau::cortex::Cortex;
use satzbau::generator::{GenerationParams, SentenceGenerator};
use satzbau::rate_limiter::RateLimiter;
use satzbau::service::{self, AppState};
use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// German sentence practice server
#[derive(Parser)]
#[command(name = "satzbau")]
#[command(version)]
#[command(about = "Serves LLM-generated German sentences, audio and Anki exports", long_about = None)]
struct Cli {
    /// Extra config file layered over the defaults
    #[arg(short, long)]
    config: Option<String>,

    /// Bind address (overrides bind_host)
    #[arg(long)]
    host: Option<String>,

    /// Port (overrides port)
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("satzbau=info"))
        .init();

    let cli = Cli::parse();
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        settings.bind_host = host;
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }

    if settings.openai_api_key.is_empty() {
        log::warn!("No API key configured (SATZBAU_OPENAI_API_KEY / OPENAI_API_KEY); sentence generation will fail");
    }

    let cortex = Cortex::from_settings(&settings)?;
    log::info!("Using model {} at {}", cortex.model(), settings.openai_base_url);

    let locator = AudioLocator::from_settings(&settings)?;
    log::info!(
        "Audio cache at {:?} (tts backend: {})",
        locator.dir(),
        settings.tts_backend
    );

    let rate_limiter = Arc::new(RateLimiter::from_settings(&settings));
    let state = AppState {
        generator: SentenceGenerator::new(Arc::new(cortex), GenerationParams::from(&settings)),
        locator,
        rate_limiter: rate_limiter.clone(),
    };

    if rate_limiter.is_enabled() {
        log::info!(
            "Rate limits per client and minute: generate={} audio={} export={}",
            settings.rate_limit_generate,
            settings.rate_limit_audio,
            settings.rate_limit_export
        );
        // Forget idle clients every ten minutes
        tokio::spawn(async move {
            let mut tick = tokio::time::interval(Duration::from_secs(600));
            loop {
                tick.tick().await;
                rate_limiter.cleanup(600);
            }
        });
    }

    let app = service::router(state, &settings.api_prefix, &settings.audio_url_prefix);

    let addr = format!("{}:{}", settings.bind_host, settings.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    log::info!("satzbau listening on http://{}{}", addr, settings.api_prefix);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
