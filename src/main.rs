use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::error;

use gdbsearch::call_path::CallPath;
use gdbsearch::error::Error;
use gdbsearch::finding::FindingIndex;
use gdbsearch::gdbinit;
use gdbsearch::html_renderer::HtmlRenderer;
use gdbsearch::predicate::Predicate;
use gdbsearch::probe::ProbeRegistry;
use gdbsearch::raw_data;
use gdbsearch::search_driver::{SearchContext, SearchDriver};
use gdbsearch::session::{GdbSession, Session};
use gdbsearch::source_resolver::SourceResolver;

const IDLE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_ENTRY_SYMBOL: &str = "main";

/// Drives an external debugger to locate the source lines that cause a
/// measurable change in a chosen runtime metric.
#[derive(Parser, Debug)]
#[clap(name = "gdbsearch", version)]
struct Cli {
    /// Shell-quoted command that, when executed, yields a debugger
    /// attached to the target (e.g. `"gdb --quiet ./target"`).
    debugger_command: Option<String>,

    /// Selects a probe from the registry (default: private-memory).
    metric_name: Option<String>,

    /// A literal encoding of a list of call paths to bootstrap the queue
    /// (default `[[]]`, the program entry function alone).
    initial_paths: Option<String>,

    /// The delta predicate, with two free variables `n` (new) and `p`
    /// (previous).
    #[clap(short = 'e', long = "predicate")]
    predicate: Option<String>,

    /// Output directory for HTML pages (default: a temp directory).
    #[clap(short = 'o', long = "out-dir")]
    out_dir: Option<PathBuf>,

    /// Emit raw data instead of HTML.
    #[clap(short = 'd', long = "dump")]
    dump: bool,

    /// Load a previously-saved raw-data file and render HTML without
    /// running the debugger.
    #[clap(short = 'l', long = "load")]
    load: Option<PathBuf>,

    /// A `.gdbinit`-style file to harvest source search directories from.
    #[clap(long = "gdbinit")]
    gdbinit: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::from(0),
        Err(Error::Configuration(msg)) => {
            eprintln!("configuration error: {}", msg);
            ExitCode::from(1)
        }
        Err(e) => {
            error!("fatal error: {}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let out_dir = cli
        .out_dir
        .unwrap_or_else(|| std::env::temp_dir().join("gdbsearch-out"));

    let search_dirs = match &cli.gdbinit {
        Some(path) => gdbinit::search_dirs_from_file(path)?,
        None => Vec::new(),
    };
    let mut resolver = SourceResolver::new(search_dirs);

    let index = if let Some(load_path) = &cli.load {
        raw_data::load(load_path)?
    } else {
        let debugger_command = cli
            .debugger_command
            .ok_or_else(|| Error::Configuration("debugger_command is required unless -l is given".to_string()))?;

        let predicate = match &cli.predicate {
            // an unparsable -e expression is a configuration mistake, not a
            // debugger-interaction failure, so it exits 1 rather than 2.
            Some(src) => Predicate::parse(src).map_err(|e| match e {
                Error::InvalidPredicate(msg) => Error::Configuration(msg),
                other => other,
            })?,
            None => Predicate::default_predicate(),
        };

        let metric_name = cli.metric_name.as_deref().unwrap_or(ProbeRegistry::DEFAULT_NAME);
        let registry = ProbeRegistry::with_reference_probes();
        let probe = registry.get(metric_name)?;

        let initial_paths_src = cli.initial_paths.as_deref().unwrap_or("[[]]");
        let initial_paths =
            CallPath::parse_initial_paths(initial_paths_src).map_err(Error::Configuration)?;

        let mut ctx = SearchContext::new(resolver);
        let mut driver = SearchDriver::new(
            initial_paths,
            || -> Result<Box<dyn Session>, Error> {
                let session =
                    GdbSession::start(&debugger_command, DEFAULT_ENTRY_SYMBOL, IDLE_TIMEOUT)?;
                Ok(Box::new(session))
            },
            &predicate,
            probe,
        );
        driver.run(&mut ctx)?;
        resolver = ctx.source_resolver;

        ctx.report_store.into_index()
    };

    if cli.dump {
        let dump_path = out_dir.join("gdbsearch.json");
        std::fs::create_dir_all(&out_dir)?;
        raw_data::dump(&index, &dump_path)?;
    } else {
        render(&index, &mut resolver, &out_dir)?;
    }

    Ok(())
}

fn render(index: &FindingIndex, resolver: &mut SourceResolver, out_dir: &std::path::Path) -> Result<(), Error> {
    HtmlRenderer::render_all(index, resolver, out_dir)
}
