use anyhow::Result;
use chronoscope_tui::config::AppConfig;
use chronoscope_tui::internal::ui::app::App;
use chronoscope_tui::tui;
use tracing_subscriber::EnvFilter;

const LOG_FILE_NAME: &str = "chronoscope.log";

fn env_filter(config: &AppConfig) -> EnvFilter {
    // RUST_LOG wins over the config file when set.
    match std::env::var("RUST_LOG") {
        Ok(_) => EnvFilter::from_default_env(),
        Err(_) => EnvFilter::new(config.logging.filter_directives()),
    }
}

fn init_console_logging(config: &AppConfig) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load();

    // A bad base URL should be reported on the console, before the screen is taken over.
    let mut app = match App::new(config.clone()) {
        Ok(app) => app,
        Err(e) => {
            init_console_logging(&config);
            tracing::error!("{:#}", e);
            return Err(e);
        }
    };

    // Logs must not go to stdout/stderr while the TUI owns the terminal.
    match tui::init() {
        Ok(terminal) => {
            let file_appender =
                tracing_appender::rolling::daily(config.log_directory(), LOG_FILE_NAME);
            let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

            tracing_subscriber::fmt()
                .with_env_filter(env_filter(&config))
                .with_writer(non_blocking)
                .with_ansi(false)
                .compact()
                .init();

            tracing::info!(version = %app.app_version, base_url = %config.api.base_url, "ChronoScope starting");
            let res = app.run(terminal).await;

            tui::restore()?;

            if let Err(err) = res {
                tracing::error!("Application error: {:#}", err);
                eprintln!("{err:?}");
            }
            Ok(())
        }
        Err(e) => {
            init_console_logging(&config);
            eprintln!("Failed to initialize TUI: {e:?}");
            Err(e.into())
        }
    }
}
