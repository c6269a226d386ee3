use clap::Parser;
use link_preview::{
    log_error_card, log_preview_card, setup_logging, ErrorRecord, LogConfig, PreviewOutput,
    PreviewService, PreviewServiceConfig,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "link-preview",
    about = "Print link preview metadata for a URL as a single JSON record"
)]
struct Cli {
    /// Page to preview
    url: Option<String>,
    /// Per-request timeout in seconds
    #[arg(default_value_t = 5)]
    timeout: u64,
    /// Log filter for stderr output (RUST_LOG takes precedence)
    #[arg(long, default_value = "warn")]
    log_level: String,
    /// Also write logs to a daily rotated file in this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn log_config(&self) -> LogConfig {
        let mut config = LogConfig {
            log_level: self.log_level.clone(),
            ..LogConfig::default()
        };
        if let Some(dir) = &self.log_dir {
            config.log_dir = dir.clone();
            config.file_output = true;
        }
        config
    }
}

fn emit<T: serde::Serialize>(record: &T) {
    match serde_json::to_string(record) {
        Ok(json) => println!("{json}"),
        Err(e) => println!(r#"{{"error": "Failed to encode output: {e}"}}"#),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(cli.log_config());

    let Some(url) = cli.url else {
        emit(&ErrorRecord::new("No URL provided"));
        return ExitCode::FAILURE;
    };

    let service = PreviewService::new_with_config(
        PreviewServiceConfig::new().with_timeout(Duration::from_secs(cli.timeout)),
    );

    let result = service.generate_preview(&url).await;
    match &result {
        Ok(preview) => log_preview_card(preview, &url),
        Err(e) => {
            e.log();
            log_error_card(&url, e);
        }
    }

    emit(&PreviewOutput::from(result));
    ExitCode::SUCCESS
}
