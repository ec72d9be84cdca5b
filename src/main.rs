use artgrab::config::{self, PipelineConfig};
use artgrab::pipeline::{Pipeline, PipelineEvent};
use artgrab::{identifier, output};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread::JoinHandle;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "artgrab")]
#[command(about = "Find, verify, border-trim and bundle artwork for a title")]
#[command(long_about = "\
Find, verify, border-trim and bundle artwork for a title

Give artgrab a title URL or a bare 7-9 digit identifier. It derives every
artwork URL its strategy catalog knows about, probes them in parallel, strips
letterbox/pillarbox borders from the ones that load, and writes either the
single image or a .tar.gz of all of them.

Accepted input:
  80057281
  https://www.example.com/title/80057281
  https://www.example.com/watch/80057281?trackId=1
  https://www.example.com/browse?jbv=80057281

Settings are read from artgrab.toml in the --config directory; flags override
the file. Set ARTGRAB_LOG (e.g. ARTGRAB_LOG=debug) for diagnostic logging.

Run 'artgrab gen-config' to generate a documented artgrab.toml.")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

/// Flags shared by every command.
#[derive(clap::Args, Clone)]
struct GlobalArgs {
    /// Directory holding artgrab.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Maximum simultaneous probes
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Per-candidate timeout in seconds
    #[arg(long, global = true, conflicts_with = "timeout_ms")]
    timeout_secs: Option<u64>,

    /// Per-candidate timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Blank threshold for border trimming (0-255)
    #[arg(long, global = true)]
    threshold: Option<u8>,

    /// Archive raw bytes without trimming borders
    #[arg(long, global = true)]
    no_trim: bool,

    /// Print machine-readable JSON instead of progress lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Print the canonical identifier extracted from the input
    Resolve { input: String },
    /// List generated candidates without touching the network
    Candidates { input: String },
    /// Probe every candidate and list the ones that load
    Probe { input: String },
    /// Run the full pipeline and write the image or archive
    Fetch {
        input: String,
        /// Directory to write the result into
        #[arg(long, default_value = ".")]
        output: PathBuf,
    },
    /// Print a stock artgrab.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();
    let global = &cli.global;

    match cli.command {
        Command::Resolve { input } => {
            let id = identifier::resolve(&input)?;
            if global.json {
                println!("{}", serde_json::to_string_pretty(&id)?);
            } else {
                println!("{}", id);
            }
        }
        Command::Candidates { input } => {
            let pipeline = Pipeline::new(load_pipeline_config(global)?)?;
            let id = pipeline.resolve(&input)?;
            let candidates = pipeline.candidates(&id)?;
            if global.json {
                println!("{}", serde_json::to_string_pretty(&candidates)?);
            } else {
                output::print_candidates(&id, &candidates);
            }
        }
        Command::Probe { input } => {
            let (pipeline, printer) = build_pipeline(global)?;
            let candidates = match pipeline.resolve(&input).and_then(|id| pipeline.candidates(&id)) {
                Ok(candidates) => candidates,
                Err(e) => {
                    finish_printer(pipeline, printer)?;
                    return Err(e.into());
                }
            };
            let report = pipeline.probe(&candidates);
            finish_printer(pipeline, printer)?;

            if global.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                output::print_probe_report(&report);
            }
            report.survivors()?;
        }
        Command::Fetch { input, output: out_dir } => {
            let (pipeline, printer) = build_pipeline(global)?;
            let result = pipeline.run(&input);
            finish_printer(pipeline, printer)?;
            let harvest = result?;

            std::fs::create_dir_all(&out_dir)?;
            let path = out_dir.join(&harvest.filename);
            std::fs::write(&path, &harvest.bytes)?;
            if global.json {
                println!("{}", serde_json::to_string_pretty(&harvest)?);
            } else {
                output::print_harvest_output(&harvest, &path.display().to_string());
            }
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostic logging to stderr, filtered by `ARTGRAB_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var("ARTGRAB_LOG")
        .from_env_lossy();
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Load `artgrab.toml` and apply command-line overrides on top.
fn load_pipeline_config(args: &GlobalArgs) -> Result<PipelineConfig, config::ConfigError> {
    let mut config = config::load_config(&args.config)?;
    if let Some(n) = args.concurrency {
        config.probe.concurrency = n;
    }
    if let Some(secs) = args.timeout_secs {
        config.probe.timeout_ms = secs.saturating_mul(1000);
    }
    if let Some(ms) = args.timeout_ms {
        config.probe.timeout_ms = ms;
    }
    if let Some(t) = args.threshold {
        config.trim.threshold = t;
    }
    if args.no_trim {
        config.trim.enabled = false;
    }
    config.validate()?;
    Ok(config)
}

/// Build a pipeline and, unless `--json` is set, a printer thread that
/// renders its progress events.
fn build_pipeline(
    args: &GlobalArgs,
) -> Result<(Pipeline, Option<JoinHandle<()>>), Box<dyn std::error::Error>> {
    let pipeline = Pipeline::new(load_pipeline_config(args)?)?;
    if args.json {
        return Ok((pipeline, None));
    }
    let (tx, printer) = spawn_printer();
    Ok((pipeline.with_events(tx), Some(printer)))
}

fn spawn_printer() -> (Sender<PipelineEvent>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_event(&event) {
                println!("{}", line);
            }
        }
    });
    (tx, printer)
}

/// Drop the pipeline (closing the event channel) and wait for the printer.
fn finish_printer(
    pipeline: Pipeline,
    printer: Option<JoinHandle<()>>,
) -> Result<(), Box<dyn std::error::Error>> {
    drop(pipeline);
    if let Some(handle) = printer {
        handle.join().map_err(|_| "progress printer panicked")?;
    }
    Ok(())
}
