//! Peer Assess - command-line gateway to the assessment ledger.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, store I/O, corrupt store, etc.)
//!   2 - Request rejected (invalid submission, duplicate, unknown candidate, etc.)

use anyhow::{Context, Result};
use peer_assess::cli::{Args, Command, OutputFormat};
use peer_assess::config::{Config, CONFIG_FILE_NAME};
use peer_assess::report;
use peer_assess::{
    AssessmentService, JsonFileStore, Nomination, Rubric, ServiceError, SubmissionRequest,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle init-config early (no logging needed)
    if matches!(args.command, Command::InitConfig) {
        return handle_init_config();
    }

    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(&args, &config);

    info!("Peer Assess v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(&args, &config) {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<ServiceError>() {
            Some(rejection) if rejection.is_rejection() => {
                eprintln!("Rejected: {}", rejection);
                std::process::exit(2);
            }
            _ => {
                error!("Command failed: {:#}", e);
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        },
    }
}

/// Handle init-config: generate a default .peer-assess.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to set the store path, feedback limit and seed candidates.");
    Ok(())
}

/// Initialize logging based on verbosity settings. Logs go to stderr.
fn init_logging(args: &Args, config: &Config) {
    let level = if !args.quiet && config.general.verbose {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a tracing subscriber was already installed");
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => Ok(config),
        Ok(None) => Ok(Config::default()),
        Err(e) => {
            eprintln!("Warning: failed to load {}: {:#}", CONFIG_FILE_NAME, e);
            Ok(Config::default())
        }
    }
}

/// Open the store and execute the requested command.
fn run(args: &Args, config: &Config) -> Result<()> {
    let store = JsonFileStore::open(&config.general.store_path).with_context(|| {
        format!(
            "Failed to open store {}",
            config.general.store_path.display()
        )
    })?;

    let service = AssessmentService::new(store, Rubric::from(&config.rubric));

    let seeded = service.seed_candidates(&config.seed)?;
    if seeded > 0 {
        debug!("Seeded {} candidates from config", seeded);
    }

    match &args.command {
        Command::Candidates => {
            let candidates = service.candidates()?;
            emit(
                args.format,
                candidates.as_slice(),
                report::generate_candidates_markdown,
            )
        }
        Command::Candidate { id } => {
            let candidate = service.candidate(id)?;
            emit(args.format, &candidate, report::generate_candidate_markdown)
        }
        Command::Nominate {
            name,
            address,
            statement,
            nominated_by,
        } => {
            let candidate = service.nominate(Nomination {
                name: name.clone().unwrap_or_default(),
                address: address.clone().unwrap_or_default(),
                statement: statement.clone(),
                nominated_by: nominated_by.clone(),
            })?;
            emit(args.format, &candidate, |c| {
                format!("Candidate nominated successfully: `{}`\n", c.id)
            })
        }
        Command::Withdraw { id, by } => {
            service.withdraw(id, by)?;
            println!("Nomination withdrawn: {}", id);
            Ok(())
        }
        Command::Assess {
            candidate,
            assessor,
            traits,
            feedback,
            signature,
        } => {
            let request = SubmissionRequest {
                candidate: candidate.clone(),
                assessor: assessor.clone(),
                traits: (!traits.is_empty())
                    .then(|| traits.iter().cloned().collect::<BTreeMap<_, _>>()),
                feedback: feedback.clone(),
                signature: signature.clone(),
            };
            let assessment = service.submit(&request)?;
            emit(args.format, &assessment, report::generate_receipt_markdown)
        }
        Command::Results { id } => {
            let results = service.results(id)?;
            if results.score.assessment_count == 0 {
                warn!("No assessments yet for {}", results.candidate.id);
            }
            emit(args.format, &results, report::generate_results_markdown)
        }
        Command::Leaderboard => {
            let board = service.leaderboard()?;
            emit(args.format, &board, report::generate_leaderboard_markdown)
        }
        Command::Stats => {
            let stats = service.stats()?;
            emit(args.format, &stats, report::generate_stats_markdown)
        }
        Command::Feedback { id } => {
            let feedback = service.feedback(id)?;
            emit(
                args.format,
                feedback.as_slice(),
                report::generate_feedback_markdown,
            )
        }
        Command::InitConfig => unreachable!("init-config is dispatched before the store is opened"),
    }
}

/// Print a view in the requested format.
fn emit<T, F>(format: OutputFormat, value: &T, markdown: F) -> Result<()>
where
    T: Serialize + ?Sized,
    F: FnOnce(&T) -> String,
{
    let output = match format {
        OutputFormat::Json => report::generate_json(value)?,
        OutputFormat::Markdown => markdown(value),
    };
    println!("{}", output.trim_end());
    Ok(())
}
