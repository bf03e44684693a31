use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use std::sync::OnceLock;
use std::time::Duration;

/// Set up log levels, formatting, and the progress output shared with logs
pub struct Logger {
    multi_progress: MultiProgress,
}

static LOGGER: OnceLock<Logger> = OnceLock::new();

impl<'a> Logger {
    pub fn init() -> &'a Self {
        LOGGER.get_or_init(|| {
            let logger = env_logger::Builder::from_env(
                // Only human-friendly messages by default
                // Enable logs output with "export RUST_LOG=info" in terminal
                env_logger::Env::default().default_filter_or("off"),
            )
            .build();

            let level = logger.filter();
            let multi_progress = MultiProgress::new();

            if let Err(e) = LogWrapper::new(multi_progress.clone(), logger).try_init() {
                eprintln!("Failed to set up logger: {e}");
            }

            log::set_max_level(level);
            Self { multi_progress }
        })
    }

    pub fn multi_progress() -> &'a MultiProgress {
        &Self::init().multi_progress
    }

    /// A spinner which does not interfere with log lines
    pub fn spinner(message: &str) -> ProgressBar {
        let spinner = Self::multi_progress().add(ProgressBar::new_spinner());

        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }

        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(120));
        spinner
    }
}
