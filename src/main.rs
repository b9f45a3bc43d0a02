//! tablegen - Synthetic Table Data Generator
//!
//! Entry point for the CLI application.

use anyhow::{Context, Result};
use clap::Parser;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tablegen::config::{CliArgs, Config, Operation};
use tablegen::ops;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = CliArgs::parse();

    setup_logging(args.verbose)?;

    #[cfg(feature = "profiling")]
    let profiler = start_profiler(&args)?;
    #[cfg(not(feature = "profiling"))]
    {
        if args.cpuprofile.is_some() {
            eprintln!("Warning: built without the 'profiling' feature; --cpuprofile ignored");
        }
    }

    // Spec preview needs only the SQL file
    if args.show_spec {
        let sql = args.sql.as_deref().context("--sql is required")?;
        let specs = tablegen::schema::specs_from_sql(sql)?;
        print!("{}", tablegen::schema::display::format_specs_table(&specs));
        return Ok(());
    }

    let cfg_path = args.cfg.as_deref().context("--cfg is required")?;
    let cfg = Config::load(cfg_path).context("Invalid configuration")?;

    let shutdown = setup_signal_handler()?;

    let result = match args.op {
        Operation::Create => ops::run_create(&args, cfg, Arc::clone(&shutdown)),
        Operation::Upload => ops::run_upload(&args, cfg, Arc::clone(&shutdown)),
        Operation::Show => ops::run_show(cfg),
        Operation::Delete => ops::run_delete(&args, cfg, Arc::clone(&shutdown)),
    };

    #[cfg(feature = "profiling")]
    finish_profiler(profiler, &args)?;

    result.map_err(Into::into)
}

/// Install a Ctrl+C handler that requests a graceful stop, then forces
/// exit on the second interrupt.
fn setup_signal_handler() -> Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&shutdown);
    let count = Arc::new(std::sync::atomic::AtomicU32::new(0));

    ctrlc::set_handler(move || {
        let previous = count.fetch_add(1, Ordering::SeqCst);
        if previous == 0 {
            eprintln!("\nInterrupt received, finishing in-flight files...");
            eprintln!("Press Ctrl+C again to force exit immediately.");
            flag.store(true, Ordering::SeqCst);
        } else {
            eprintln!("\nForced exit!");
            std::process::exit(130);
        }
    })
    .context("Failed to set signal handler")?;

    Ok(shutdown)
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("tablegen=debug,warn")
    } else {
        EnvFilter::new("tablegen=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

#[cfg(feature = "profiling")]
fn start_profiler(args: &CliArgs) -> Result<Option<pprof::ProfilerGuard<'static>>> {
    if args.cpuprofile.is_none() {
        return Ok(None);
    }
    let guard = pprof::ProfilerGuardBuilder::default()
        .frequency(99)
        .build()
        .context("Failed to start CPU profiler")?;
    Ok(Some(guard))
}

#[cfg(feature = "profiling")]
fn finish_profiler(
    profiler: Option<pprof::ProfilerGuard<'static>>,
    args: &CliArgs,
) -> Result<()> {
    let (Some(guard), Some(path)) = (profiler, args.cpuprofile.as_deref()) else {
        return Ok(());
    };
    let report = guard.report().build().context("CPU profile report failed")?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create profile output {}", path.display()))?;
    report
        .flamegraph(file)
        .context("Failed to write flamegraph")?;
    eprintln!("CPU profile written to {}", path.display());
    Ok(())
}
