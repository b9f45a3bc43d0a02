//! Progress reporting for file generation
//!
//! Atomic file/byte counters updated from any worker thread, rendered by a
//! ticker thread driving an indicatif progress bar. A disabled logger is a
//! pure counter, used by tests and `--quiet`.

use console::style;
use humansize::{format_size, BINARY};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

/// Ticker refresh interval
const TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Shared progress counters with optional terminal rendering.
pub struct ProgressLogger {
    files: AtomicU64,
    bytes: AtomicU64,
    total_files: u64,
    stop: AtomicBool,
    bar: Option<ProgressBar>,
    ticker: Mutex<Option<JoinHandle<()>>>,
}

impl ProgressLogger {
    /// Create an enabled logger and start its ticker thread.
    pub fn new(total_files: u64, action: &str) -> Arc<Self> {
        let bar = ProgressBar::new(total_files);
        bar.set_style(
            ProgressStyle::with_template(
                "{prefix:.cyan} [{elapsed_precise}] {bar:34} {pos}/{len} files {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_prefix(action.to_string());

        let logger = Arc::new(Self {
            files: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            total_files,
            stop: AtomicBool::new(false),
            bar: Some(bar),
            ticker: Mutex::new(None),
        });

        let ticker_ref = Arc::clone(&logger);
        let handle = std::thread::Builder::new()
            .name("progress-ticker".into())
            .spawn(move || ticker_ref.run_ticker())
            .ok();
        if let Ok(mut slot) = logger.ticker.lock() {
            *slot = handle;
        }

        logger
    }

    /// Create a counter-only logger with no terminal output.
    pub fn disabled() -> Arc<Self> {
        Arc::new(Self {
            files: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            total_files: 0,
            stop: AtomicBool::new(false),
            bar: None,
            ticker: Mutex::new(None),
        })
    }

    /// Increment the completed-file counter.
    pub fn update_files(&self, delta: u64) {
        if delta > 0 {
            self.files.fetch_add(delta, Ordering::Relaxed);
        }
    }

    /// Increment the written-bytes counter.
    pub fn update_bytes(&self, delta: u64) {
        if delta > 0 {
            self.bytes.fetch_add(delta, Ordering::Relaxed);
        }
    }

    /// Current (files, bytes) counts.
    pub fn snapshot(&self) -> (u64, u64) {
        (
            self.files.load(Ordering::Acquire),
            self.bytes.load(Ordering::Acquire),
        )
    }

    fn run_ticker(&self) {
        let Some(bar) = &self.bar else {
            return;
        };

        let mut prev_bytes = 0u64;
        loop {
            std::thread::sleep(TICK_INTERVAL);

            let (files, bytes) = self.snapshot();
            let rate = (bytes.saturating_sub(prev_bytes)) as f64 / TICK_INTERVAL.as_secs_f64();
            prev_bytes = bytes;

            bar.set_position(files);
            bar.set_message(format!(
                "{} ({}/s)",
                format_size(bytes, BINARY),
                format_size(rate as u64, BINARY)
            ));

            if self.stop.load(Ordering::Acquire)
                || (self.total_files > 0 && files >= self.total_files)
            {
                break;
            }
        }
    }

    /// Stop the ticker and finalize the bar.
    pub fn finish(&self) {
        self.stop.store(true, Ordering::Release);
        let handle = self.ticker.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            let _ = handle.join();
        }
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}

impl Drop for ProgressLogger {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
    }
}

/// Print a header at the start of generation.
pub fn print_header(format: &str, path: &str, files: u64, threads: usize, streaming: bool) {
    println!();
    println!(
        "{} {}",
        style("tablegen").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Format:").bold(), format);
    println!("  {} {}", style("Output:").bold(), path);
    println!("  {} {}", style("Files:").bold(), files);
    println!("  {} {}", style("Threads:").bold(), threads);
    println!(
        "  {} {}",
        style("Mode:").bold(),
        if streaming { "streaming" } else { "direct" }
    );
    println!();
}

/// Print a summary after generation completes.
pub fn print_summary(format: &str, files: u64, rows: u64, bytes: u64, duration: Duration) {
    let duration_secs = duration.as_secs_f64();
    let throughput = if duration_secs > 0.0 {
        (bytes as f64 / duration_secs) as u64
    } else {
        0
    };

    println!();
    println!("{}", style("Generation Complete").green().bold());
    println!("{}", style("─".repeat(50)).dim());
    println!("  {} {}", style("Format:").bold(), format);
    println!("  {} {}", style("Files:").bold(), format_number(files));
    println!("  {} {}", style("Rows:").bold(), format_number(rows));
    println!(
        "  {} {}",
        style("Bytes:").bold(),
        format_size(bytes, BINARY)
    );
    println!(
        "  {} {:.1}s ({}/s)",
        style("Duration:").bold(),
        duration_secs,
        format_size(throughput, BINARY)
    );
    println!();
}

/// Format a number with thousands separators
pub fn format_number(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
