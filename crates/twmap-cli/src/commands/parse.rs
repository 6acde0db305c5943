//! Parse command - Replay captured session output into the map

use std::collections::BTreeMap;
use std::io::{IsTerminal, Read, Write};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, info};
use twmap_config::TwmapConfig;
use twmap_core::writer::FLASH_SEQUENCE;
use twmap_core::{
    GraphStore, LoginScript, MapStats, QuitStatus, RecordingSink, SessionContext, Settings,
    StreamParser, Suggestion, SuggestionKind, WriteQueue, WriteSink, WriterOptions,
};

use super::{open_store, print_info};
use crate::GlobalOptions;

/// Size of the reads fed to the parser, roughly one network receive.
const CHUNK_SIZE: usize = 4096;

/// Arguments for the parse command
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Captured session files (raw terminal output); reads stdin when empty
    files: Vec<PathBuf>,

    /// Report what would be written without touching the database
    #[arg(long)]
    dry_run: bool,

    /// Output map statistics as JSON
    #[arg(long)]
    json: bool,

    /// Print the replies a live session would have sent at each prompt
    #[arg(long)]
    replies: bool,
}

/// Result of replaying captured input through one parser.
#[derive(Debug, Default)]
struct Replay {
    lines: usize,
    replies: Vec<Suggestion>,
}

/// Execute the parse command
pub fn execute(args: ParseArgs, config: &TwmapConfig, global: &GlobalOptions) -> Result<()> {
    let inputs = read_inputs(&args.files)?;
    let store = if args.dry_run && !config.storage.database.exists() {
        GraphStore::in_memory().context("Failed to create scratch database")?
    } else {
        open_store(config)?
    };
    let settings = Settings::from_persisted(
        store
            .load_settings()
            .context("Failed to load persisted settings")?,
    );
    let login = &config.session.login;
    let mut context = SessionContext::new(settings, config.session.auto_haggle).with_login(
        LoginScript::new(login.name.clone(), login.game.clone(), login.password.clone()),
    );
    // an explicit flag beats the value stored in the map
    if let Some(auto_haggle) = global.auto_haggle() {
        context.auto_haggle = auto_haggle;
    }

    if args.dry_run {
        let sink = RecordingSink::new();
        let outcome = replay(&sink, context, config, &inputs);
        if args.replies {
            print_replies(&outcome.replies);
        }
        let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
        for op in sink.ops() {
            *counts.entry(op.name()).or_default() += 1;
        }
        println!("{} lines, {} writes", outcome.lines, counts.values().sum::<usize>());
        for (name, count) in counts {
            println!("  {:<16} {}", name, count);
        }
        return Ok(());
    }

    let mut options =
        WriterOptions::default().with_idle_wait(Duration::from_millis(config.writer.idle_wait_ms));
    if config.writer.flash_on_settle && std::io::stderr().is_terminal() {
        options = options.on_settle(|_| {
            let mut stderr = std::io::stderr();
            let _ = stderr.write_all(FLASH_SEQUENCE.as_bytes());
            let _ = stderr.flush();
        });
    }
    let queue = WriteQueue::spawn(store, options).context("Failed to start database writer")?;
    let monitor = queue
        .monitor(Duration::from_secs(config.writer.monitor_interval_secs.max(1)))
        .context("Failed to start queue monitor")?;

    let outcome = replay(&queue, context, config, &inputs);
    info!(lines = outcome.lines, replies = outcome.replies.len(), "Session replayed");

    if let QuitStatus::Draining(pending) = queue.quit() {
        print_info(
            &format!("Waiting for {} database writes to finish...", pending),
            global.quiet,
        );
    }
    queue.shutdown().context("Database writer failed")?;
    monitor.join().context("Queue monitor failed")?;

    if args.replies {
        print_replies(&outcome.replies);
    }
    let stats = open_store(config)?.stats().context("Failed to read map statistics")?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        print_stats(&stats, outcome.lines);
    }
    Ok(())
}

/// Read every input up front so a missing file fails before anything is written.
fn read_inputs(files: &[PathBuf]) -> Result<Vec<Vec<u8>>> {
    if files.is_empty() {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(vec![buf]);
    }
    files
        .iter()
        .map(|path| {
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
        })
        .collect()
}

/// Feed each input through one parser.
///
/// Consecutive chunks are treated as separated by a quiet period, so an
/// unterminated prompt at the end of a chunk is answered the way it would
/// be live.
fn replay<S: WriteSink>(
    sink: S,
    context: SessionContext,
    config: &TwmapConfig,
    inputs: &[Vec<u8>],
) -> Replay {
    let debounce = Duration::from_millis(config.session.debounce_ms);
    let mut parser = StreamParser::new(sink, context).with_debounce(debounce);
    let mut clock = Instant::now();
    let mut outcome = Replay::default();
    for input in inputs {
        for chunk in input.chunks(CHUNK_SIZE) {
            outcome.lines += parser.feed_at(chunk, clock);
            clock += debounce;
            outcome.replies.extend(parser.poll_idle(clock));
        }
        parser.finish();
        debug!(bytes = input.len(), "Input finished");
    }
    outcome
}

fn print_replies(replies: &[Suggestion]) {
    for reply in replies {
        let kind = match reply.kind {
            SuggestionKind::Haggle => "haggle",
            SuggestionKind::Login => "login",
        };
        println!("{}: {}", kind, String::from_utf8_lossy(&reply.bytes).trim_end());
    }
}

fn print_stats(stats: &MapStats, lines: usize) {
    println!("Parsed {} lines", lines);
    println!("  Sectors:  {}", stats.sectors);
    println!("  Warps:    {}", stats.warps);
    println!("  Explored: {}", stats.explored);
    println!("  Ports:    {}", stats.ports);
    println!("  Planets:  {}", stats.planets);
    println!("  Fighters: {}", stats.fighters);
}
