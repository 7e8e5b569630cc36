use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::Parser;
use clap::builder::{NonEmptyStringValueParser, TypedValueParser};
use tracing_subscriber::EnvFilter;

use event_audit::config::{AuditConfig, default_work_dir};
use event_audit::scan::{DEFAULT_CONCURRENCY, ScanOptions, SearchEngine};

/// Find OpenAPI event schemas that an application never references.
///
/// Clones the repository holding the specification, collects every schema
/// whose name contains a dot, searches the application directory for each
/// name as a whole word, and prints the names that never occur.
#[derive(Parser)]
#[command(name = "event-audit", version, about)]
struct Cli {
    /// Git URL of the repository holding the OpenAPI specification.
    #[arg(long, env = "EVENT_AUDIT_GIT", value_parser = NonEmptyStringValueParser::new())]
    git: String,

    /// Directory of spec files, relative to the repository root.
    #[arg(long, env = "EVENT_AUDIT_SPEC", value_parser = NonEmptyStringValueParser::new())]
    spec: String,

    /// Application source tree to search for event names.
    #[arg(long, env = "EVENT_AUDIT_DIR", value_parser = NonEmptyStringValueParser::new())]
    dir: String,

    /// Where the repository is cloned. Defaults to the executable's directory.
    #[arg(long, env = "EVENT_AUDIT_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Maximum number of searches running at once.
    #[arg(
        long,
        env = "EVENT_AUDIT_CONCURRENCY",
        default_value_t = DEFAULT_CONCURRENCY,
        value_parser = clap::value_parser!(u16).range(1..).map(usize::from)
    )]
    concurrency: usize,

    /// Per-search time limit in seconds.
    #[arg(
        long,
        env = "EVENT_AUDIT_SEARCH_TIMEOUT",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    search_timeout: u64,

    /// Search implementation.
    #[arg(long, env = "EVENT_AUDIT_ENGINE", value_enum, default_value_t = SearchEngine::Grep)]
    engine: SearchEngine,

    /// Leave the cloned repository on disk.
    #[arg(long)]
    keep_clone: bool,

    /// Suppress progress output.
    #[arg(long, short)]
    quiet: bool,

    /// Enable debug logging (overrides RUST_LOG).
    #[arg(long, short)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> event_audit::error::Result<()> {
    let work_dir = match cli.work_dir {
        Some(dir) => dir,
        None => default_work_dir()?,
    };

    let config = AuditConfig {
        git: cli.git,
        spec: cli.spec,
        app_dir: PathBuf::from(cli.dir),
        work_dir,
        scan: ScanOptions {
            engine: cli.engine,
            concurrency: cli.concurrency,
            timeout: Duration::from_secs(cli.search_timeout),
        },
        keep_clone: cli.keep_clone,
        quiet: cli.quiet,
    };

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| event_audit::error::Error::Runtime(e.to_string()))?;
    let report = rt.block_on(event_audit::audit::run_audit(&config))?;

    if !cli.quiet {
        eprintln!(
            "Checked {} events from {} spec files: {} used, {} unused, {} unchecked",
            report.events,
            report.documents,
            report.scan.used,
            report.scan.unused.len(),
            report.scan.unchecked.len()
        );
    }
    event_audit::report::print_unchecked(&report.scan.unchecked);
    event_audit::report::print_events(report.unused());

    Ok(())
}
