//! Per-file streaming pairs and the worker pool
//!
//! Streaming mode runs one producer/uploader pair per file: the producer
//! generates chunks on the pool thread while a dedicated uploader thread
//! drains the file's bounded channel into the object writer. Each file owns
//! its channel and writer outright; nothing is shared across files, so the
//! data path needs no locks.
//!
//! Error flow: an uploader failure drops the channel receiver, which fails
//! the producer's next send; the uploader's error wins when both report.
//! The writer is closed on every exit path. A failing file does not cancel
//! its siblings - the pool records the first error and lets the rest
//! settle.

use crate::error::{Result, TableGenError, WorkerError};
use crate::storage::ObjectFileWriter;
use crate::writer::chunk::FileChunk;
use crate::writer::FormatGenerator;
use crossbeam_channel::bounded;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Chunks buffered per file before the producer blocks
const CHUNK_CHANNEL_CAPACITY: usize = 4;

/// Runs producer/uploader pairs for streaming generation.
pub struct StreamingCoordinator {
    format: Arc<dyn FormatGenerator>,
    shutdown: Arc<AtomicBool>,
}

impl StreamingCoordinator {
    pub fn new(format: Arc<dyn FormatGenerator>, shutdown: Arc<AtomicBool>) -> Self {
        Self { format, shutdown }
    }

    /// Generate and upload one file through a paired uploader thread.
    ///
    /// The writer is owned (and always closed) by the uploader.
    pub fn run_file(&self, file_no: u64, mut writer: Box<dyn ObjectFileWriter>) -> Result<()> {
        let (chunk_tx, chunk_rx) = bounded::<FileChunk>(CHUNK_CHANNEL_CAPACITY);

        std::thread::scope(|scope| {
            let uploader = scope.spawn(move || -> Result<()> {
                let mut write_error: Option<TableGenError> = None;

                for chunk in chunk_rx.iter() {
                    if !chunk.data.is_empty() {
                        if let Err(e) = writer.write_all(&chunk.data) {
                            write_error = Some(e.into());
                            break;
                        }
                    }
                    if chunk.is_last {
                        break;
                    }
                }

                // Finalize whatever was written, even after an error
                let close_result = writer.close();
                match write_error {
                    Some(e) => Err(e),
                    None => close_result.map_err(Into::into),
                }
            });

            let producer_result =
                self.format
                    .generate_streaming(file_no, &chunk_tx, &self.shutdown);
            drop(chunk_tx);

            let uploader_result = match uploader.join() {
                Ok(result) => result,
                Err(_) => Err(WorkerError::Panicked { file_no }.into()),
            };

            debug!(file_no, ok = producer_result.is_ok(), "file pair settled");

            // The uploader's error explains a failed producer send
            uploader_result?;
            producer_result
        })
    }
}

/// Run `job` for every file index in `[start, end)` on a pool of `threads`
/// workers.
///
/// The first error is kept and returned after all in-flight files settle;
/// remaining queued indices are still processed. A raised shutdown flag
/// stops workers from picking up new files.
pub fn run_pool<F>(
    threads: usize,
    start: u64,
    end: u64,
    shutdown: &AtomicBool,
    job: F,
) -> Result<()>
where
    F: Fn(u64) -> Result<()> + Sync,
{
    if start >= end {
        return Ok(());
    }

    let (index_tx, index_rx) = crossbeam_channel::unbounded::<u64>();
    for file_no in start..end {
        // Receiver outlives this loop; send cannot fail
        let _ = index_tx.send(file_no);
    }
    drop(index_tx);

    let first_error: Mutex<Option<TableGenError>> = Mutex::new(None);
    let worker_count = threads.min((end - start) as usize).max(1);

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            let index_rx = index_rx.clone();
            let first_error = &first_error;
            let job = &job;
            scope.spawn(move || {
                while let Ok(file_no) = index_rx.recv() {
                    if shutdown.load(Ordering::Relaxed) {
                        break;
                    }
                    if let Err(e) = job(file_no) {
                        let mut slot = match first_error.lock() {
                            Ok(slot) => slot,
                            Err(poisoned) => poisoned.into_inner(),
                        };
                        if slot.is_none() {
                            *slot = Some(e);
                        }
                    }
                }
            });
        }
    });

    let slot = match first_error.into_inner() {
        Ok(slot) => slot,
        Err(poisoned) => poisoned.into_inner(),
    };
    match slot {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
