use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use minify_core::{
    calibrate, AssertAnnotation, CandidatePredicate, ExecInfo, MinifyConfig, PatternPredicate,
    ProcessOracle, Reducer, ReducerConfig, WorkingCopySink, Workspace,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

mod discover;
mod report;

pub use discover::{collect_sources, find_root};

#[derive(Parser)]
#[command(name = "minify")]
#[command(about = "Remove proof annotations the verifier does not need", long_about = None)]
#[command(version)]
struct Cli {
    /// Package directory holding the header-tagged files
    package: PathBuf,

    /// Path to the verifier jar (defaults to $GOBRA)
    #[arg(long)]
    gobra: Option<PathBuf>,

    /// Interpreter used to run the verifier jar
    #[arg(long)]
    java: Option<String>,

    /// Interpreter argument placed before `-jar` (repeatable; replaces the defaults)
    #[arg(long = "jvm-arg", allow_hyphen_values = true)]
    jvm_args: Vec<String>,

    /// Per-attempt deadline (e.g. 90s, 1m30s, 1.5s); default is baseline time + 10%
    #[arg(long)]
    baseline: Option<String>,

    /// Output directory for `<file>.working` snapshots
    #[arg(long, default_value = ".")]
    output: PathBuf,

    /// Regex selecting lines to chop (replaces the assert-annotation rule)
    #[arg(long)]
    pattern: Option<String>,

    /// Header text marking files handed to the verifier
    #[arg(long)]
    header: Option<String>,

    /// File marking the project root
    #[arg(long)]
    module_marker: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a Markdown summary of the run
    #[arg(long)]
    report: Option<PathBuf>,

    /// Enable verbose logging (echoes verifier output)
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long)]
    quiet: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<MinifyConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("failed to read config {}", path.display()))?;
                MinifyConfig::from_toml_str(&raw)
                    .with_context(|| format!("invalid config {}", path.display()))?
            }
            None => MinifyConfig::default(),
        };

        if let Some(jar) = &self.gobra {
            config.verifier.jar = Some(jar.clone());
        }
        if let Some(java) = &self.java {
            config.verifier.java = java.clone();
        }
        if !self.jvm_args.is_empty() {
            config.verifier.jvm_args = self.jvm_args.clone();
        }
        if let Some(deadline) = &self.baseline {
            config.deadline = Some(deadline.clone());
        }
        if let Some(pattern) = &self.pattern {
            config.pattern = Some(pattern.clone());
        }
        if let Some(header) = &self.header {
            config.header_marker = header.clone();
        }
        if let Some(marker) = &self.module_marker {
            config.module_marker = marker.clone();
        }

        let config = config.with_env_fallback();
        config.validate()?;
        Ok(config)
    }
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = cli.resolve_config()?;
    run(&cli, &config).await
}

async fn run(cli: &Cli, config: &MinifyConfig) -> Result<()> {
    let root = find_root(&cli.package, &config.module_marker)?;
    let sources = collect_sources(&cli.package, &config.header_marker)?;
    let predicate = candidate_predicate(config)?;

    let exec = ExecInfo {
        interpreter: config.verifier.java.clone(),
        verifier_jar: config
            .verifier
            .jar
            .clone()
            .context("verifier jar is not set")?,
        root,
    };
    log::debug!("verifier: {exec:?}");
    let oracle = ProcessOracle::new(exec, config.verifier.clone());
    let workspace = Workspace::create().context("failed to create workspace")?;

    let deadline = match config.deadline()? {
        Some(deadline) => deadline,
        None => calibrate(&oracle, &workspace, &sources).await?.deadline,
    };
    log::info!("using deadline {deadline:?}");

    let reducer = Reducer::new(
        sources,
        workspace,
        oracle,
        WorkingCopySink::new(&cli.output),
        ReducerConfig {
            deadline,
            predicate,
        },
    );
    let reductions = reducer.reduce_all().await?;

    for reduction in &reductions {
        log::info!(
            "{}: removed {} of {} candidate lines",
            reduction.file,
            reduction.removed.len(),
            reduction.candidates
        );
    }

    if let Some(path) = &cli.report {
        write_report(path, &cli.package, deadline, &reducer, &reductions)?;
    }

    Ok(())
}

fn candidate_predicate(config: &MinifyConfig) -> Result<Box<dyn CandidatePredicate>> {
    Ok(match &config.pattern {
        Some(pattern) => Box::new(PatternPredicate::new(pattern)?),
        None => Box::new(AssertAnnotation::default()),
    })
}

fn write_report<O, S>(
    path: &Path,
    package: &Path,
    deadline: Duration,
    reducer: &Reducer<O, S>,
    reductions: &[minify_core::Reduction],
) -> Result<()>
where
    O: minify_core::Oracle,
    S: minify_core::SnapshotSink,
{
    let md = report::render_reduction_report(package, deadline, reducer.sources(), reductions);
    fs::write(path, md).with_context(|| format!("failed to write report {}", path.display()))
}
