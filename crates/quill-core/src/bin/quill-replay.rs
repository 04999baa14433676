//! Replay a recorded agent transcript through a research session.
//!
//! Each transcript line is one JSON object:
//!
//! ```text
//! {"state": { ...remote bag... }}
//! {"interrupt": {"value": { ...proposal... }}}
//! ```

use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use quill_approval::{Interrupt, ResumePayload};
use quill_core::{ResearchSession, SessionConfig, SessionEvent, SessionOutcome};
use quill_state::{DurableCache, FileCache};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

const DEFAULT_CACHE_DIR: &str = ".quill-cache";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum TranscriptLine {
    State(Map<String, Value>),
    Interrupt(InterruptLine),
}

#[derive(Debug, Deserialize)]
struct InterruptLine {
    #[serde(default)]
    value: Value,
}

fn cli() -> Command {
    Command::new("quill-replay")
        .version(quill_core::VERSION)
        .about("Replay a research agent transcript and print the resulting document view")
        .arg(
            Arg::new("transcript")
                .required(true)
                .value_parser(value_parser!(PathBuf))
                .help("JSON-lines transcript of state pushes and interrupts"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(value_parser!(PathBuf))
                .help("Session config (TOML)"),
        )
        .arg(
            Arg::new("cache-dir")
                .long("cache-dir")
                .value_parser(value_parser!(PathBuf))
                .help("Durable cache directory [default: .quill-cache]"),
        )
        .arg(
            Arg::new("slot")
                .long("slot")
                .help("Durable cache slot"),
        )
        .arg(
            Arg::new("approve")
                .long("approve")
                .action(ArgAction::SetTrue)
                .conflicts_with("reject")
                .help("Approve every proposal"),
        )
        .arg(
            Arg::new("reject")
                .long("reject")
                .action(ArgAction::SetTrue)
                .help("Reject every proposal"),
        )
        .arg(
            Arg::new("remarks")
                .long("remarks")
                .help("Remarks sent with each decision"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON"),
        )
}

fn load_config(matches: &ArgMatches) -> Result<SessionConfig> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(slot) = matches.get_one::<String>("slot") {
        config = config.with_cache_slot(slot.clone());
    }
    if let Some(dir) = matches.get_one::<PathBuf>("cache-dir") {
        config = config.with_cache_dir(dir.clone());
    }
    Ok(config)
}

fn init_tracing(fallback: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn parse_transcript(text: &str) -> Result<Vec<TranscriptLine>> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(n, line)| {
            serde_json::from_str(line).with_context(|| format!("transcript line {}", n + 1))
        })
        .collect()
}

/// Decision applied to every approval round
#[derive(Debug, Clone, Default)]
struct Reviewer {
    decision: Option<bool>,
    remarks: Option<String>,
}

fn dispatch(session: &mut ResearchSession, event: SessionEvent) -> Option<SessionOutcome> {
    let name = event.name();
    match session.handle(event) {
        Ok(outcome) => {
            tracing::debug!(event = name, ?outcome, "event handled");
            Some(outcome)
        }
        Err(e) => {
            tracing::warn!(event = name, error = %e, noop = e.is_noop(), "event refused");
            None
        }
    }
}

/// Feed transcript lines into the session
///
/// A decision is only submitted for interrupts the session accepted.
fn feed(
    session: &mut ResearchSession,
    lines: Vec<TranscriptLine>,
    reviewer: &Reviewer,
) -> Vec<oneshot::Receiver<ResumePayload>> {
    let mut pending = Vec::new();
    for line in lines {
        match line {
            TranscriptLine::State(bag) => {
                dispatch(session, SessionEvent::RemoteState(bag));
            }
            TranscriptLine::Interrupt(InterruptLine { value }) => {
                let (interrupt, resumed) = Interrupt::new(value);
                pending.push(resumed);
                let raised = dispatch(session, SessionEvent::Interrupt(interrupt)).is_some();
                let Some(decision) = reviewer.decision.filter(|_| raised) else {
                    continue;
                };
                if let Some(remarks) = &reviewer.remarks {
                    dispatch(session, SessionEvent::SetRemarks(remarks.clone()));
                }
                dispatch(session, SessionEvent::Submit(decision));
            }
        }
    }
    pending
}

async fn replay(path: &Path, config: SessionConfig, reviewer: Reviewer) -> Result<()> {
    let text = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading transcript {}", path.display()))?;
    let lines = parse_transcript(&text)?;

    let cache = FileCache::new(
        config
            .cache_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
    );
    tracing::info!(dir = %cache.dir().display(), slot = %config.cache_slot, "using file cache");
    let cache: Arc<dyn DurableCache> = Arc::new(cache);

    let (mut session, mut publications) = ResearchSession::open(config, cache).await?;
    let publisher = tokio::spawn(async move {
        let mut published = 0_u64;
        while let Some(publication) = publications.recv().await {
            tracing::info!(
                revision = publication.revision,
                provenance = ?publication.provenance,
                "state published"
            );
            published += 1;
        }
        published
    });

    let pending = feed(&mut session, lines, &reviewer);
    session.flush().await;

    for mut resumed in pending {
        match resumed.try_recv() {
            Ok(payload) => tracing::info!(body = %payload.body(), "agent resumed"),
            Err(_) => tracing::warn!("interrupt left unanswered"),
        }
    }
    for (key, (title, _)) in session.state().approved_outline() {
        tracing::info!(%key, %title, "approved outline section");
    }

    println!("{}", serde_json::to_string_pretty(&session.view())?);

    drop(session);
    let published = publisher.await.context("publication task failed")?;
    tracing::info!(published, "replay finished");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = cli().get_matches();
    let config = load_config(&matches)?;
    init_tracing(&config.log_filter, matches.get_flag("log-json"));

    let decision = if matches.get_flag("approve") {
        Some(true)
    } else if matches.get_flag("reject") {
        Some(false)
    } else {
        None
    };
    let reviewer = Reviewer {
        decision,
        remarks: matches.get_one::<String>("remarks").cloned(),
    };
    let transcript = matches
        .get_one::<PathBuf>("transcript")
        .context("transcript path required")?;

    replay(transcript, config, reviewer).await
}
