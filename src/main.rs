use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use futures::StreamExt;
use thiserror::Error;
use tokio::io::AsyncWriteExt;

use vidchat::config::{self, ClientConfig, ConfigError};
use vidchat::poller::{PollPhase, StatusPoller, StatusView};
use vidchat::ui::{chat_id_from_route, status_screen, LandingPage, Navigator, SubmitOutcome};
use vidchat::{ApiClient, ApiError, ChatApi, ChatService, TokioClock};

mod cli;

use cli::{Cli, Commands, ConnectionArgs};

#[derive(Debug, Error)]
enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("Output error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remembers the last route instead of rendering a page for it.
#[derive(Debug, Default)]
struct TerminalNavigator {
    last_route: Mutex<Option<String>>,
}

impl TerminalNavigator {
    fn last_route(&self) -> Option<String> {
        self.last_route.lock().ok().and_then(|route| route.clone())
    }
}

impl Navigator for TerminalNavigator {
    fn push(&self, route: &str) {
        tracing::debug!(route, "navigating");
        if let Ok(mut last) = self.last_route.lock() {
            *last = Some(route.to_string());
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_logging() {
        eprintln!("Failed to initialize logging: {}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode, AppError> {
    let config = load_config(&cli.connection)?;
    tracing::debug!(base_url = %config.api_base_url, "configuration loaded");

    let service = Arc::new(ChatService::new(ApiClient::from_config(&config)?));

    match cli.command {
        Commands::Submit { url, watch } => submit(service, &config, &url, watch).await,
        Commands::Status { chat_id } => Ok(watch_status(service, &config, Some(&chat_id)).await),
        Commands::Send { chat_id, message } => send(&service, &chat_id, &message).await,
    }
}

fn load_config(args: &ConnectionArgs) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::from_lookup(|key| {
        if key == config::BASE_URL_VAR {
            if let Some(url) = &args.api_base_url {
                return Some(url.clone());
            }
        }
        std::env::var(key).ok()
    })?;

    if let Some(ms) = args.poll_interval_ms {
        config.poll_interval = Duration::from_millis(ms);
    }
    Ok(config)
}

async fn submit(service: Arc<ChatService>, config: &ClientConfig, url: &str, watch: bool) -> Result<ExitCode, AppError> {
    let navigator = Arc::new(TerminalNavigator::default());
    let mut page = LandingPage::new(service.clone(), navigator.clone());

    let source_url = match page.begin_submit(url) {
        Ok(source_url) => source_url,
        Err(err) => {
            eprintln!("{}", err);
            return Ok(ExitCode::from(2));
        }
    };
    eprintln!("{}", page.submit_label());
    let result = service.create_chat(&source_url).await;

    match page.finish_submit(&source_url, result) {
        SubmitOutcome::Invalid(err) => {
            eprintln!("{}", err);
            Ok(ExitCode::from(2))
        }
        SubmitOutcome::Failed(message) => {
            eprintln!("{}", message);
            Ok(ExitCode::FAILURE)
        }
        SubmitOutcome::Created { chat_id, video_id, .. } => {
            println!("Chat created: {}", chat_id);
            if let Some(video_id) = video_id {
                println!("Video: {}", video_id);
            }
            if !watch {
                println!("Follow progress with: vidchat status {}", chat_id);
                return Ok(ExitCode::SUCCESS);
            }
            let routed = navigator.last_route().and_then(|route| chat_id_from_route(&route));
            Ok(watch_status(service, config, routed.as_deref()).await)
        }
    }
}

/// Render the status screen on every change until polling ends or the user
/// interrupts.
async fn watch_status(api: Arc<dyn ChatApi>, config: &ClientConfig, chat_id: Option<&str>) -> ExitCode {
    let poller = StatusPoller::new(api, Arc::new(TokioClock), config.poll_config());
    let mut view = StatusView::new(Arc::new(poller));
    view.show(chat_id);

    let mut rx = view.subscribe();
    let mut last_rendered = String::new();

    loop {
        let state = rx.borrow_and_update().clone();
        let rendered = status_screen(&state).render();
        if rendered != last_rendered {
            println!("{}\n", rendered);
            last_rendered = rendered;
        }

        match state.phase {
            PollPhase::Completed => return ExitCode::SUCCESS,
            PollPhase::Idle | PollPhase::Failed | PollPhase::FetchFailed => return ExitCode::FAILURE,
            PollPhase::Polling => {}
        }

        tokio::select! {
            changed = rx.changed() => {
                if changed.is_err() {
                    return ExitCode::FAILURE;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted, stopping status polling");
                view.unmount();
                return ExitCode::from(130);
            }
        }
    }
}

async fn send(service: &ChatService, chat_id: &str, message: &str) -> Result<ExitCode, AppError> {
    let response = service.send_message(chat_id, message).await?;
    let mut stream = response.bytes_stream();
    let mut stdout = tokio::io::stdout();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(ApiError::from)?;
        stdout.write_all(&chunk).await?;
        stdout.flush().await?;
    }
    stdout.write_all(b"\n").await?;
    Ok(ExitCode::SUCCESS)
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    // Get log level from environment or default per build mode
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "info,vidchat=debug,reqwest=info,hyper=info".to_string()
        } else {
            "warn,vidchat=info,reqwest=warn,hyper=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    // Rendered screens go to stdout, logs to stderr
    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed()
    } else {
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .boxed()
    };

    tracing_subscriber::registry().with(env_filter).with(fmt_layer).try_init()?;

    tracing::debug!("vidchat {} ({})", env!("CARGO_PKG_VERSION"), if cfg!(debug_assertions) { "development" } else { "production" });
    Ok(())
}
