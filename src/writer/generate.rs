//! Generation orchestration
//!
//! [`FileGenerator`] owns everything a `create` run needs: the validated
//! config, shared column specs, the object store, the format generator, and
//! the progress sink. It drives the worker pool in either direct or
//! streaming mode and names output objects.

use crate::config::Config;
use crate::error::Result;
use crate::progress::ProgressLogger;
use crate::schema::ColumnSpec;
use crate::storage::{self, ObjectFileWriter, ObjectStore};
use crate::writer::streaming::{run_pool, StreamingCoordinator};
use crate::writer::{new_format_generator, FormatGenerator, WriterWithStats};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

/// Orchestrates one generation run.
pub struct FileGenerator {
    cfg: Arc<Config>,
    store: Arc<dyn ObjectStore>,
    format: Arc<dyn FormatGenerator>,
    progress: Arc<ProgressLogger>,
    shutdown: Arc<AtomicBool>,
}

impl FileGenerator {
    /// Build the store and format generator for a validated config.
    pub fn new(
        cfg: Config,
        specs: Vec<ColumnSpec>,
        progress: Arc<ProgressLogger>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = Arc::from(storage::new_store(&cfg)?);
        let specs: Arc<[ColumnSpec]> = specs.into();
        let format = new_format_generator(&cfg, specs)?;

        Ok(Self {
            cfg: Arc::new(cfg),
            store,
            format,
            progress,
            shutdown,
        })
    }

    /// Object name for a file index.
    pub fn object_name(&self, file_no: u64) -> String {
        let common = &self.cfg.common;
        let suffix = self.format.file_suffix();
        if common.folders <= 1 {
            format!("{}.{}.{}", common.prefix, file_no, suffix)
        } else {
            format!(
                "part{:05}/{}.{}.{}",
                file_no % common.folders,
                common.prefix,
                file_no,
                suffix
            )
        }
    }

    /// Generate every file in `[start_fileno, end_fileno)`.
    pub fn run(&self, threads: usize) -> Result<()> {
        let streaming = self.cfg.common.use_streaming_mode;
        info!(
            start = self.cfg.common.start_fileno,
            end = self.cfg.common.end_fileno,
            threads,
            streaming,
            "starting generation"
        );

        let result = if streaming {
            self.generate_streaming(threads)
        } else {
            self.generate_direct(threads)
        };
        self.store.close();
        result
    }

    fn open_writer(&self, file_no: u64) -> Result<WriterWithStats> {
        let name = self.object_name(file_no);
        let writer = self.store.create(&name)?;
        Ok(WriterWithStats::new(writer, Arc::clone(&self.progress)))
    }

    fn generate_direct(&self, threads: usize) -> Result<()> {
        let common = &self.cfg.common;
        run_pool(
            threads,
            common.start_fileno,
            common.end_fileno,
            &self.shutdown,
            |file_no| {
                let mut writer = self.open_writer(file_no)?;
                let result = self.format.generate_file(&mut writer, file_no);
                let close_result = writer.close();
                result?;
                close_result?;
                self.progress.update_files(1);
                Ok(())
            },
        )
    }

    fn generate_streaming(&self, threads: usize) -> Result<()> {
        let common = &self.cfg.common;
        let coordinator =
            StreamingCoordinator::new(Arc::clone(&self.format), Arc::clone(&self.shutdown));

        run_pool(
            threads,
            common.start_fileno,
            common.end_fileno,
            &self.shutdown,
            |file_no| {
                let writer = self.open_writer(file_no)?;
                coordinator.run_file(file_no, Box::new(writer))?;
                self.progress.update_files(1);
                Ok(())
            },
        )
    }
}
