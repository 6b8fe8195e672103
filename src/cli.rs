use crate::{
    classify::classify_line,
    config::Config,
    engine::{Engine, ScriptEngine},
    extract::parse_summary,
    service::ReconService,
    util::{decode_line, ensure_dir, strip_ansi},
};
use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "recon-hub")]
#[command(about = "Job orchestrator and log-streaming API for external reconnaissance pipelines")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./recon-hub.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the HTTP API.
    Serve {
        /// Listen address, overrides server.bind.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Check the pipeline interpreter, script and work root.
    Doctor {},
    /// Classify a captured pipeline log ("-" for stdin) and print events.
    Classify {
        #[arg(long)]
        input: PathBuf,
    },
    /// Parse a summary artifact and print the extracted counters.
    Summary {
        #[arg(long)]
        input: PathBuf,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = match resolve_config_path(args.config.as_deref())? {
        Some(path) => Config::load(&path)?,
        None => Config::default(),
    };
    let log_path = resolve_log_path(&cfg);
    let _guard = init_logging(&args, &cfg, log_path.as_deref())?;

    match &args.cmd {
        Command::Serve { bind } => serve(&cfg, bind.as_deref()),
        Command::Doctor {} => doctor(&cfg),
        Command::Classify { input } => classify(input),
        Command::Summary { input } => summary(input),
    }
}

fn resolve_config_path(user: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(p) = user {
        if !p.exists() {
            return Err(anyhow!("config not found: {}", p.display()));
        }
        return Ok(Some(p.to_path_buf()));
    }
    for candidate in ["recon-hub.toml", "recon-hub.example.toml"] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    // stdout may carry command output (classify, summary), so logs go to stderr.
    let stderr_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.work_root).join("recon-hub.log"))
}

fn serve(cfg: &Config, bind_override: Option<&str>) -> Result<()> {
    let bind = bind_override.unwrap_or(cfg.server.bind.as_str()).to_string();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .with_context(|| "building tokio runtime")?;

    let service = ReconService::from_config(cfg)?;
    info!(
        "pipeline interpreter={} script={} work_root={}",
        cfg.pipeline.interpreter, cfg.pipeline.script, cfg.paths.work_root
    );
    runtime.block_on(crate::http::serve(service, &bind))
}

fn doctor(cfg: &Config) -> Result<()> {
    let engine = ScriptEngine::new(cfg)?;
    let diag = engine.doctor()?;
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn classify(input: &Path) -> Result<()> {
    let reader: Box<dyn Read> = if input == Path::new("-") {
        Box::new(std::io::stdin())
    } else {
        Box::new(
            std::fs::File::open(input)
                .with_context(|| format!("open input: {}", input.display()))?,
        )
    };
    let mut reader = BufReader::new(reader);

    let mut events = Vec::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| "reading input")?;
        if n == 0 {
            break;
        }
        let line = strip_ansi(&decode_line(&buf));
        events.extend(classify_line(line.trim()));
    }

    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

fn summary(input: &Path) -> Result<()> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("reading summary: {}", input.display()))?;
    let workdir = input
        .parent()
        .and_then(Path::parent)
        .unwrap_or_else(|| Path::new("."));
    let record = parse_summary(&content, workdir);
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}
