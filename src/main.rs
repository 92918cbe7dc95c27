use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::runtime::Builder;
use tracing::{Level, info, warn};

use sim_router::{Command, Output, Router, RouterConfig, RouterHandle, RouterService};

#[derive(Parser)]
#[command(name = "sim-router", about = "Simulated IP router driven by line commands")]
struct Cli {
    /// JSON router configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of interfaces (overrides the config file)
    #[arg(long)]
    nics: Option<usize>,

    /// Unreachable metric sentinel (overrides the config file)
    #[arg(long)]
    unreachable: Option<u32>,

    /// Command file, stdin when absent
    #[arg(long)]
    input: Option<PathBuf>,

    /// Print one JSON object per output record
    #[arg(long)]
    json: bool,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn router_config(&self) -> Result<RouterConfig> {
        let mut config = match &self.config {
            Some(path) => RouterConfig::load(path)?,
            None => RouterConfig::default(),
        };
        if let Some(nics) = self.nics {
            config.num_nics = nics;
        }
        if let Some(unreachable) = self.unreachable {
            config.metric_unreachable = unreachable;
        }
        Ok(config)
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // stdout reste réservé aux sorties du routeur
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = cli.router_config()?;

    let rt = Builder::new_multi_thread().enable_all().build()?;

    rt.block_on(serve(&cli, config))
}

async fn serve(cli: &Cli, config: RouterConfig) -> Result<()> {
    let router = Router::initialize(config)?;
    let handle = RouterService::spawn(router);
    let mut out = BufWriter::new(tokio::io::stdout());

    let result = run(cli, &handle, &mut out).await;
    let flushed = out.flush().await;

    let stats = handle.shutdown().await?;
    info!(
        "Done: {} forwarding rules, {} routes, {} updates, {} advertisements",
        stats.forwarding_rules,
        stats.routes,
        stats.protocol.updates,
        stats.protocol.advertisements
    );

    result?;
    flushed.context("failed to flush output")
}

async fn run<W>(cli: &Cli, handle: &RouterHandle, out: &mut W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("failed to open input {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut lines = reader.lines();
    let mut line_no = 0;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let command = match Command::parse_line(&line, line_no) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) if e.is_parse_error() => {
                warn!("Skipping malformed input: {}", e);
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("line {} rejected", line_no)),
        };

        let outputs = handle
            .execute(command)
            .await
            .with_context(|| format!("line {} rejected", line_no))?;
        for output in &outputs {
            write_output(out, output, cli.json).await?;
        }
    }

    Ok(())
}

async fn write_output<W>(out: &mut W, output: &Output, json: bool) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut text = if json {
        serde_json::to_string(output)?
    } else {
        output.to_string()
    };
    text.push('\n');
    out.write_all(text.as_bytes()).await?;
    Ok(())
}
