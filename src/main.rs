//! Replay ODAS JSON output files to the viz server at real-time speed.
//!
//! 1. Generate the JSON files: `odaslive -c respeaker_4_file_test.cfg`
//! 2. Start the viz server: `cd viz && node server.js`
//! 3. Replay: `odas-replay --loop`

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use odas_replay::{
    PacingMode, Replay, ReplayConfig, ReplayError, RunSummary, SessionOutcome, TokenizerMode,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "odas-replay")]
#[command(about = "Replay ODAS output to the viz server")]
struct Cli {
    /// YAML config file; flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Viz server host IP (default: host.docker.internal, else localhost).
    #[arg(long)]
    host: Option<String>,

    /// Path to SSL (potential sources) output JSON file.
    #[arg(long, visible_alias = "potential")]
    ssl: Option<PathBuf>,

    /// Path to SST (tracked sources) output JSON file.
    #[arg(long, visible_alias = "tracking")]
    sst: Option<PathBuf>,

    /// Loop the replay continuously.
    #[arg(long = "loop")]
    loop_forever: bool,

    /// Samples per hop in the recording.
    #[arg(long)]
    hop_size: Option<u32>,

    /// Sample rate of the recording in Hz.
    #[arg(long)]
    sample_rate: Option<u32>,

    /// Pacing strategy: deadline (drift-free) or fixed (sleep one hop per frame).
    #[arg(long, value_parser = parse_pacing)]
    pacing: Option<PacingMode>,

    /// Frame boundary detection: scanner or boundary.
    #[arg(long, value_parser = parse_tokenizer)]
    tokenizer: Option<TokenizerMode>,

    /// Log per-connection and per-frame detail.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_config(self) -> odas_replay::Result<ReplayConfig> {
        let mut config = match &self.config {
            Some(path) => ReplayConfig::load(path)?,
            None => ReplayConfig::default(),
        };

        if let Some(host) = self.host {
            config.host = Some(host);
        }
        if let Some(path) = self.ssl {
            config.potential_path = path;
        }
        if let Some(path) = self.sst {
            config.tracking_path = path;
        }
        if self.loop_forever {
            config.loop_forever = true;
        }
        if let Some(hop_size) = self.hop_size {
            config.hop_size = hop_size;
        }
        if let Some(sample_rate) = self.sample_rate {
            config.sample_rate = sample_rate;
        }
        if let Some(pacing) = self.pacing {
            config.pacing = pacing;
        }
        if let Some(tokenizer) = self.tokenizer {
            config.tokenizer = tokenizer;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_pacing(value: &str) -> Result<PacingMode, String> {
    match value {
        "deadline" => Ok(PacingMode::Deadline),
        "fixed" => Ok(PacingMode::Fixed),
        other => Err(format!("unknown pacing '{other}' (expected deadline or fixed)")),
    }
}

fn parse_tokenizer(value: &str) -> Result<TokenizerMode, String> {
    match value {
        "scanner" => Ok(TokenizerMode::Scanner),
        "boundary" => Ok(TokenizerMode::Boundary),
        other => Err(format!("unknown tokenizer '{other}' (expected scanner or boundary)")),
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "odas_replay=info",
            1 => "odas_replay=debug",
            _ => "odas_replay=trace",
        })
    });
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init().ok();
}

/// Exit status after a second Ctrl+C, as a shell reports SIGINT
const INTERRUPTED: i32 = 130;

/// Non-zero for any error, refusal included; a user stop is a clean exit.
fn exit_code(result: &odas_replay::Result<RunSummary>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = cli.into_config()?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        on_ctrl_c.cancel();
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted again, exiting without cleanup");
            std::process::exit(INTERRUPTED);
        }
    });

    info!("Press Ctrl+C to stop.");
    let result = Replay::run(&config, &cancel).await;
    match &result {
        Ok(summary) => {
            if let SessionOutcome::StoppedByUser { .. } = summary.last {
                info!("Stopped by user.");
            }
            info!(
                "Replayed {} frames over {} session(s)",
                summary.frames_sent, summary.sessions
            );
        }
        Err(e @ ReplayError::ConnectionRefused { .. }) => {
            error!("{}", e);
            eprintln!("ERROR: Could not connect. Is the viz server running?");
            for suggestion in e.recovery_suggestions().iter().skip(1) {
                eprintln!("  {}", suggestion);
            }
        }
        Err(e) => error!("{}", e),
    }
    Ok(exit_code(&result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use odas_replay::StreamRole;

    #[test]
    fn refusal_exits_non_zero() {
        let refused = Err(ReplayError::connection_refused(
            StreamRole::Potential,
            "127.0.0.1:9001",
            std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
        ));
        assert_eq!(exit_code(&refused), ExitCode::FAILURE);

        let unreadable = Err(ReplayError::file_error(
            "/odas/test_data/sst_output.json",
            std::io::Error::from(std::io::ErrorKind::NotFound),
        ));
        assert_eq!(exit_code(&unreadable), ExitCode::FAILURE);
    }

    #[test]
    fn user_stop_exits_cleanly() {
        let stopped = Ok(RunSummary {
            sessions: 2,
            frames_sent: 130,
            last: SessionOutcome::StoppedByUser { frames_sent: 30 },
        });
        assert_eq!(exit_code(&stopped), ExitCode::SUCCESS);
    }

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "odas-replay",
            "--loop",
            "--potential",
            "ssl.json",
            "--pacing",
            "fixed",
        ])
        .unwrap();
        let config = cli.into_config().unwrap();

        assert!(config.loop_forever);
        assert_eq!(config.potential_path, PathBuf::from("ssl.json"));
        assert_eq!(config.tracking_path, PathBuf::from(ReplayConfig::DEFAULT_TRACKING_PATH));
        assert_eq!(config.pacing, PacingMode::Fixed);
    }

    #[test]
    fn unknown_pacing_is_rejected() {
        assert!(Cli::try_parse_from(["odas-replay", "--pacing", "eventually"]).is_err());
    }
}
