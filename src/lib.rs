//! tablegen - Parallel Synthetic Table Data Generator
//!
//! Generates large volumes of tabular test data from a SQL `CREATE TABLE`
//! schema and writes it, in parallel, as delimited text (CSV) or columnar
//! Parquet to a pluggable object store. Output is partitioned across a
//! half-open range of file indices; each file holds a configured row count
//! whose primary keys are globally unique by construction.
//!
//! # Features
//!
//! - **Schema-driven generation**: per-column specs derived from the DDL,
//!   tunable through column comments (null rates, value sets, orderings,
//!   Gaussian integers, compressibility).
//!
//! - **Real columnar output**: drives the low-level Parquet column writers
//!   with per-column encoding choices and definition levels, not a
//!   row-at-a-time shim.
//!
//! - **Bounded memory**: streaming mode overlaps generation with upload
//!   through small bounded channels, one producer/uploader pair per file.
//!
//! - **Pluggable storage**: a narrow object-store interface with a local
//!   filesystem backend built in.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    CREATE TABLE schema                       │
//! └──────────────────────────────┬───────────────────────────────┘
//!                                │ specs (shared, immutable)
//!                                ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Worker Pool (threads)                    │
//! │   file i    ┌──────────┐  chunks  ┌──────────┐               │
//! │  ─────────▶ │ producer │ ───────▶ │ uploader │──▶ writer i   │
//! │             └──────────┘ bounded  └──────────┘               │
//! │   file j    ┌──────────┐  chunks  ┌──────────┐               │
//! │  ─────────▶ │ producer │ ───────▶ │ uploader │──▶ writer j   │
//! │             └──────────┘          └──────────┘               │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//!                                ▼
//!                     ┌────────────────────┐
//!                     │    ObjectStore     │
//!                     │ (local, s3, gcs)   │
//!                     └────────────────────┘
//! ```
//!
//! # Example
//!
//! ```bash
//! # Generate 8 Parquet files of a million rows each
//! tablegen --sql schema.sql --cfg gen.toml --threads 16
//!
//! # Preview what each column will generate
//! tablegen --sql schema.sql --cfg gen.toml --show-spec
//! ```

pub mod config;
pub mod error;
pub mod ops;
pub mod progress;
pub mod schema;
pub mod storage;
pub mod writer;

pub use config::{CliArgs, Config, FileFormat, Operation};
pub use error::{Result, TableGenError};
pub use schema::{ColumnSpec, NumericOrder, SqlType};
pub use writer::FileGenerator;
