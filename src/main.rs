use clap::{Parser, Subcommand};
use imgswap::batch::{BatchDriver, BatchOptions};
use imgswap::config::{self, BackendKind, ConfigError, SwapConfig};
use imgswap::enumerate::FileOrder;
use imgswap::imaging::{ImageBackend, MagickBackend, ResizeFilter, RustBackend};
use imgswap::logging::RunLog;
use imgswap::output;
use imgswap::pairing::{AutoConfirm, Confirm, PairingMode, Selection};
use imgswap::prompt::PromptConfirm;
use serde::Serialize;
use std::error::Error;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "imgswap")]
#[command(about = "Swap a folder of images into the sizes and paths of another")]
#[command(long_about = "\
Swap a folder of images into the sizes and paths of another

Every input image is paired with a template image, stretched to the template's
exact width and height, and written to the output folder under the template's
relative path and file format.

  templates/                    output/
  ├── ui/icon.dds   (16x16)     ├── ui/icon.dds     ← dawn.jpg at 16x16
  └── walls/brick.png (512x256) └── walls/brick.png ← dusk.jpg at 512x256

Pairing modes:
  exhaust    each input used once; stop when templates run out (default)
  cycle      reuse inputs until every template is filled
  replenish  each input used once; refill templates when they run out
  confirm    ask before refilling when inputs outnumber templates

Settings are read from imgswap.toml in the current directory (or --config).
Run 'imgswap gen-config' to generate a documented config file.")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pair inputs with templates and convert them
    Swap(RunArgs),
    /// Show the pairing a swap would use, without converting anything
    Plan(RunArgs),
    /// Print a stock imgswap.toml with all options documented
    GenConfig,
}

/// Flags shared by `swap` and `plan`. Anything left unset falls back to the
/// config file, then to stock defaults.
#[derive(clap::Args, Clone)]
struct RunArgs {
    /// Folder of images to swap in
    #[arg(short, long)]
    input: PathBuf,

    /// Folder of template images whose sizes and paths are reproduced
    #[arg(short = 's', long, visible_alias = "swap-folder")]
    templates: PathBuf,

    /// Output folder
    #[arg(short, long, default_value = "output")]
    output: PathBuf,

    /// Allow a template to be used for more than one input
    #[arg(short = 'l', long = "loop")]
    loop_templates: bool,

    #[arg(long, value_enum)]
    mode: Option<PairingMode>,

    #[arg(long, value_enum)]
    selection: Option<Selection>,

    /// Seed for random selection, to reproduce an earlier run
    #[arg(long)]
    seed: Option<u64>,

    /// Order in which files are enumerated
    #[arg(long, value_enum)]
    order: Option<FileOrder>,

    /// Maximum parallel conversions
    #[arg(short, long)]
    jobs: Option<usize>,

    #[arg(long, value_enum)]
    backend: Option<BackendKind>,

    /// Resampling filter
    #[arg(long, value_enum)]
    filter: Option<ResizeFilter>,

    /// Answer yes to the confirm-mode question
    #[arg(short, long)]
    yes: bool,

    /// Config file (default: ./imgswap.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Per-run log file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Write the run summary (or the plan, for `plan`) as JSON
    #[arg(long)]
    report: Option<PathBuf>,
}

impl RunArgs {
    /// Config file merged over defaults, with these flags applied on top.
    fn resolve_config(&self) -> Result<SwapConfig, ConfigError> {
        let cwd = std::env::current_dir().map_err(|source| ConfigError::Io {
            path: PathBuf::from("."),
            source,
        })?;
        let mut config = config::load_config(self.config.as_deref(), &cwd)?;

        if let Some(mode) = self.mode {
            config.pairing.mode = mode;
        }
        if let Some(selection) = self.selection {
            config.pairing.selection = selection;
        }
        if self.loop_templates {
            config.pairing.allow_duplicates = true;
        }
        if let Some(seed) = self.seed {
            config.pairing.seed = Some(seed);
        }
        if let Some(order) = self.order {
            config.files.order = order;
        }
        if let Some(jobs) = self.jobs {
            config.processing.max_processes = Some(jobs);
        }
        if let Some(kind) = self.backend {
            config.backend.kind = kind;
        }
        if let Some(filter) = self.filter {
            config.backend.filter = filter;
        }
        if let Some(file) = &self.log_file {
            config.logging.file = file.clone();
        }
        config.validate()
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Swap(args) => run(&args, false)?,
        Command::Plan(args) => run(&args, true)?,
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

fn run(args: &RunArgs, dry_run: bool) -> Result<(), Box<dyn Error>> {
    let config = args.resolve_config()?;
    let log = RunLog::create(&config.logging.file, &config.logging.level)?;

    log.scope(|| {
        tracing::info!(
            "imgswap {}: {} → {}",
            env!("CARGO_PKG_VERSION"),
            args.input.display(),
            args.output.display()
        );
        let result = match config.backend.kind {
            BackendKind::Rust => execute(&RustBackend::new(), args, &config, dry_run),
            BackendKind::Magick => {
                let backend = MagickBackend::with_commands(
                    config.backend.identify_command.clone(),
                    config.backend.convert_command.clone(),
                );
                execute(&backend, args, &config, dry_run)
            }
        };
        if let Err(e) = &result {
            tracing::error!("run aborted: {}", e);
        }
        result
    })?;

    println!("Log: {}", log.path().display());
    Ok(())
}

/// `--yes` answers for the operator; otherwise ask on a terminal and decline
/// when nobody can answer.
fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes {
        Box::new(AutoConfirm(true))
    } else if std::io::stdin().is_terminal() {
        Box::new(PromptConfirm::stdio())
    } else {
        Box::new(AutoConfirm(false))
    }
}

fn execute(
    backend: &impl ImageBackend,
    args: &RunArgs,
    config: &SwapConfig,
    dry_run: bool,
) -> Result<(), Box<dyn Error>> {
    let driver = BatchDriver::new(BatchOptions::from_config(
        config,
        args.input.clone(),
        args.templates.clone(),
        args.output.clone(),
    ));
    let mut confirm = confirmer(args.yes);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_event(&event);
        }
    });

    if dry_run {
        let planned = driver.plan(backend, &mut *confirm, Some(&tx));
        drop(tx);
        printer.join().map_err(|_| "progress printer panicked")?;
        let planned = planned?;

        println!();
        output::print_plan(&planned.plan, &planned.roots);
        println!("Seed: {}", planned.seed);
        if let Some(path) = &args.report {
            write_report(path, &planned.plan)?;
        }
    } else {
        let summary = driver.run(backend, &mut *confirm, Some(&tx));
        drop(tx);
        printer.join().map_err(|_| "progress printer panicked")?;
        let summary = summary?;

        println!();
        output::print_summary(&summary);
        if let Some(path) = &args.report {
            write_report(path, &summary)?;
        }
    }

    Ok(())
}

fn write_report(path: &Path, value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json)?;
    tracing::info!("report written to {}", path.display());
    Ok(())
}
