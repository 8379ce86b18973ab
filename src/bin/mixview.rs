use std::{
    io::Write as _,
    path::{Path, PathBuf},
    sync::mpsc,
    time::Duration,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "mixview", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the inputs visible on one bus (or on program output) as JSON.
    Resolve(ResolveArgs),
    /// Poll a snapshot file and print one dashboard JSON line per update.
    Watch(WatchArgs),
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Input snapshot JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Bus or input number to resolve from. Defaults to program output.
    #[arg(long)]
    bus: Option<String>,
}

#[derive(Parser, Debug)]
struct WatchArgs {
    /// Snapshot JSON, re-read every tick.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Projection config JSON. Without it only program output is tracked.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seconds between polls.
    #[arg(long, default_value_t = 5.0)]
    interval: f64,

    /// Schedule phase checks are evaluated against.
    #[arg(long, value_enum, default_value_t = PhaseChoice::Session)]
    phase: PhaseChoice,

    /// Stop after this many ticks.
    #[arg(long)]
    ticks: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PhaseChoice {
    Session,
    Break,
}

impl From<PhaseChoice> for mixview::SchedulePhase {
    fn from(p: PhaseChoice) -> Self {
        match p {
            PhaseChoice::Session => mixview::SchedulePhase::Session,
            PhaseChoice::Break => mixview::SchedulePhase::Break,
        }
    }
}

#[derive(serde::Serialize)]
struct VisibleInput<'a> {
    number: &'a mixview::InputNumber,
    key: &'a mixview::InputKey,
    title: &'a str,
    kind: mixview::InputKind,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Resolve(args) => cmd_resolve(args),
        Command::Watch(args) => cmd_watch(args),
    }
}

fn read_snapshot(path: &Path) -> anyhow::Result<mixview::Snapshot> {
    mixview::Snapshot::from_path(path).with_context(|| format!("load snapshot '{}'", path.display()))
}

fn cmd_resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let snapshot = read_snapshot(&args.in_path)?;
    let index = mixview::SnapshotIndex::build(&snapshot);

    let visible = match &args.bus {
        Some(bus) => mixview::resolve_visible(&index, &mixview::InputNumber::new(bus)),
        None => mixview::resolve_program(&index),
    };

    let out: Vec<VisibleInput<'_>> = visible
        .iter()
        .map(|i| VisibleInput {
            number: i.number(),
            key: i.key(),
            title: i.title(),
            kind: i.kind(),
        })
        .collect();

    let stdout = std::io::stdout();
    let mut lock = stdout.lock();
    serde_json::to_writer_pretty(&mut lock, &out).context("write visible set")?;
    writeln!(lock)?;
    Ok(())
}

fn cmd_watch(args: WatchArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => mixview::ProjectionConfig::from_path(path)
            .with_context(|| format!("load projection config '{}'", path.display()))?,
        None => mixview::ProjectionConfig::default(),
    };

    if !args.interval.is_finite() || args.interval <= 0.0 {
        anyhow::bail!("--interval must be a positive number of seconds");
    }
    let interval = Duration::try_from_secs_f64(args.interval)
        .with_context(|| format!("--interval {} is out of range", args.interval))?;
    let opts = mixview::PollerOpts {
        interval,
        phase: args.phase.into(),
        max_ticks: args.ticks,
    };

    let source = mixview::FileSource::new(&args.in_path);
    let mut poller = mixview::Poller::new(source, config, opts)?;

    // A failed stdout write cancels the loop; otherwise it ends on the tick limit or process exit.
    let (cancel_tx, cancel_rx) = mpsc::channel::<()>();

    let stdout = std::io::stdout();
    let mut write_err = None;
    poller.run(&cancel_rx, |dashboard| {
        if write_err.is_some() {
            return;
        }
        let mut lock = stdout.lock();
        let res = serde_json::to_writer(&mut lock, dashboard)
            .map_err(anyhow::Error::from)
            .and_then(|()| writeln!(lock).map_err(anyhow::Error::from))
            .and_then(|()| lock.flush().map_err(anyhow::Error::from));
        if let Err(e) = res {
            write_err = Some(e);
            let _ = cancel_tx.send(());
        }
    });

    match write_err {
        Some(e) => Err(e.context("write dashboard")),
        None => Ok(()),
    }
}
