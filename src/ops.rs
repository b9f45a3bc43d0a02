//! Operations dispatched from the CLI
//!
//! `create` is the core generation path; `upload`, `show`, and `delete` are
//! thin administrative passes over the object store.

use crate::config::{validate_threads, CliArgs, Config};
use crate::error::{ConfigError, Result, TableGenError};
use crate::progress::{self, ProgressLogger};
use crate::schema;
use crate::storage;
use crate::writer::streaming::run_pool;
use crate::writer::FileGenerator;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Generate data files per the config.
pub fn run_create(args: &CliArgs, cfg: Config, shutdown: Arc<AtomicBool>) -> Result<()> {
    let sql = args.sql.as_deref().ok_or(ConfigError::MissingFlag {
        flag: "sql",
        op: "create",
    })?;

    let specs = schema::specs_from_sql(sql)?;

    validate_threads(args.threads)?;
    cfg.validate()?;

    let common = &cfg.common;
    let total_files = common.end_fileno - common.start_fileno;
    let format_name = cfg.format().suffix().to_string();
    let rows_per_file = common.rows;

    if !args.quiet {
        progress::print_header(
            &format_name,
            &common.path,
            total_files,
            args.threads,
            common.use_streaming_mode,
        );
    }

    let progress = if args.quiet {
        ProgressLogger::disabled()
    } else {
        ProgressLogger::new(total_files, "writing")
    };

    let start = Instant::now();
    let generator = FileGenerator::new(cfg, specs, Arc::clone(&progress), shutdown)?;
    let result = generator.run(args.threads);
    progress.finish();

    let (files, bytes) = progress.snapshot();
    result?;

    if !args.quiet {
        progress::print_summary(
            &format_name,
            files,
            files * rows_per_file,
            bytes,
            start.elapsed(),
        );
    }
    Ok(())
}

/// Upload every file under a local directory to the configured path.
pub fn run_upload(args: &CliArgs, cfg: Config, shutdown: Arc<AtomicBool>) -> Result<()> {
    let dir = args.dir.as_deref().ok_or(ConfigError::MissingFlag {
        flag: "dir",
        op: "upload",
    })?;
    validate_threads(args.threads)?;

    let store = storage::new_store(&cfg)?;
    let files = collect_local_files(dir)?;
    if files.is_empty() {
        info!("no files to upload");
        return Ok(());
    }

    let progress = if args.quiet {
        ProgressLogger::disabled()
    } else {
        ProgressLogger::new(files.len() as u64, "uploading")
    };

    let start = Instant::now();
    let result = run_pool(
        args.threads,
        0,
        files.len() as u64,
        &shutdown,
        |index| -> Result<()> {
            let (local_path, remote_path) = &files[index as usize];
            let data = std::fs::read(local_path)?;

            let mut writer = store.create(remote_path)?;
            let write_result = writer.write_all(&data);
            let close_result = writer.close();
            write_result?;
            close_result?;

            progress.update_bytes(data.len() as u64);
            progress.update_files(1);
            Ok(())
        },
    );
    progress.finish();
    store.close();

    let (uploaded, bytes) = progress.snapshot();
    result?;

    if !args.quiet {
        progress::print_summary("upload", uploaded, 0, bytes, start.elapsed());
    }
    Ok(())
}

/// List objects at the configured path.
pub fn run_show(cfg: Config) -> Result<()> {
    let store = storage::new_store(&cfg)?;
    store.walk_dir(true, &mut |path, size| {
        println!(
            "Name: {}, Size: {}, Size (MiB): {:.6}",
            path,
            size,
            size as f64 / 1024.0 / 1024.0
        );
        Ok(())
    })?;
    store.close();
    Ok(())
}

/// Delete every object at the configured path.
pub fn run_delete(args: &CliArgs, cfg: Config, shutdown: Arc<AtomicBool>) -> Result<()> {
    validate_threads(args.threads)?;
    let store = storage::new_store(&cfg)?;

    let mut names = Vec::new();
    store.walk_dir(true, &mut |path, _| {
        names.push(path.to_string());
        Ok(())
    })?;

    if names.is_empty() {
        return Ok(());
    }

    info!(count = names.len(), "deleting objects");
    let result = run_pool(
        args.threads,
        0,
        names.len() as u64,
        &shutdown,
        |index| -> Result<()> {
            store
                .delete_file(&names[index as usize])
                .map_err(TableGenError::Storage)
        },
    );
    store.close();
    result
}

/// Recursively collect `(local, remote)` path pairs under a directory.
fn collect_local_files(dir: &Path) -> Result<Vec<(std::path::PathBuf, String)>> {
    let mut out = Vec::new();
    let mut stack = vec![dir.to_path_buf()];

    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                stack.push(path);
                continue;
            }
            let rel = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            out.push((path, rel));
        }
    }

    out.sort();
    Ok(out)
}
