//! File generation and upload
//!
//! - `chunk`: producer/uploader chunk type and row-count estimation
//! - `csv`: CSV row formatting and generator
//! - `parquet`: the columnar encoder and its streaming sink
//! - `streaming`: per-file producer/uploader pairs and the worker pool
//! - `generate`: orchestration of one `create` run

pub mod chunk;
pub mod csv;
pub mod generate;
pub mod parquet;
pub mod streaming;

pub use chunk::{ChunkCalculator, FileChunk};
pub use generate::FileGenerator;

use crate::config::{Config, FileFormat};
use crate::error::Result;
use crate::progress::ProgressLogger;
use crate::schema::ColumnSpec;
use crate::storage::ObjectFileWriter;
use crossbeam_channel::Sender;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

/// Format-specific file production.
///
/// A generator writes one complete file for a file index, either straight to
/// an object writer (direct mode) or as a sequence of [`FileChunk`]s
/// (streaming mode). Implementations are shared read-only across workers.
pub trait FormatGenerator: Send + Sync {
    /// File name suffix, e.g. "csv"
    fn file_suffix(&self) -> &'static str;

    /// Produce the whole file directly into the writer. The caller closes
    /// the writer.
    fn generate_file(&self, writer: &mut dyn ObjectFileWriter, file_no: u64) -> Result<()>;

    /// Produce the file as chunks; the final chunk carries `is_last`.
    fn generate_streaming(
        &self,
        file_no: u64,
        chunks: &Sender<FileChunk>,
        shutdown: &Arc<AtomicBool>,
    ) -> Result<()>;
}

/// Build the generator for the configured format.
pub fn new_format_generator(
    cfg: &Config,
    specs: Arc<[ColumnSpec]>,
) -> Result<Arc<dyn FormatGenerator>> {
    let generator: Arc<dyn FormatGenerator> = match cfg.format() {
        FileFormat::Csv => Arc::new(csv::CsvGenerator::new(cfg, specs)?),
        FileFormat::Parquet => Arc::new(parquet::ParquetGenerator::new(cfg, specs)?),
    };
    Ok(generator)
}

/// Writer wrapper that feeds written byte counts into progress.
pub struct WriterWithStats {
    inner: Box<dyn ObjectFileWriter>,
    progress: Arc<ProgressLogger>,
}

impl WriterWithStats {
    pub fn new(inner: Box<dyn ObjectFileWriter>, progress: Arc<ProgressLogger>) -> Self {
        Self { inner, progress }
    }
}

impl ObjectFileWriter for WriterWithStats {
    fn write(&mut self, data: &[u8]) -> crate::error::StorageResult<usize> {
        let n = self.inner.write(data)?;
        self.progress.update_bytes(n as u64);
        Ok(n)
    }

    fn close(&mut self) -> crate::error::StorageResult<()> {
        self.inner.close()
    }
}
