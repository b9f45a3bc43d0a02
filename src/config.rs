//! Configuration types for tablegen
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - The TOML configuration file (`[common]`, `[parquet]`, `[csv]`,
//!   `[s3]`, `[gcs]`)
//! - Normalization of derived values (human-size strings to bytes) and
//!   validation that collects every problem in one pass

use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Maximum reasonable thread count
pub const MAX_THREADS: usize = 512;

/// Default Parquet data page size (1 MiB)
const DEFAULT_PAGE_SIZE_BYTES: u64 = 1 << 20;

/// Synthetic table data generator with CSV and Parquet output
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tablegen",
    version,
    about = "Generate synthetic table data files from a CREATE TABLE schema",
    long_about = "Generates large volumes of tabular test data from a SQL CREATE TABLE\n\
                  schema and writes it in parallel as CSV or Parquet to a local path or\n\
                  an object store.\n\n\
                  Output is partitioned across file indices [start_fileno, end_fileno);\n\
                  every file holds a configured row count whose primary keys are\n\
                  globally unique by construction.",
    after_help = "EXAMPLES:\n    \
        # Generate files described by gen.toml from schema.sql\n    \
        tablegen --sql schema.sql --cfg gen.toml\n\n    \
        # Inspect the derived per-column generation specs\n    \
        tablegen --sql schema.sql --cfg gen.toml --show-spec\n\n    \
        # Upload a directory of pre-built files to the configured path\n    \
        tablegen --op upload --cfg gen.toml --dir ./out\n\n    \
        # List / remove objects at the configured path\n    \
        tablegen --op show --cfg gen.toml\n    \
        tablegen --op delete --cfg gen.toml"
)]
pub struct CliArgs {
    /// Operation to run
    #[arg(long = "op", value_enum, default_value_t = Operation::Create)]
    pub op: Operation,

    /// Path to the CREATE TABLE SQL file
    #[arg(long, value_name = "PATH")]
    pub sql: Option<PathBuf>,

    /// Path to the TOML config file
    #[arg(long, value_name = "PATH")]
    pub cfg: Option<PathBuf>,

    /// Number of concurrent files in flight
    #[arg(long, default_value_t = 16, value_name = "NUM")]
    pub threads: usize,

    /// Parse the SQL, print the derived per-column specs, and exit
    #[arg(long = "show-spec")]
    pub show_spec: bool,

    /// Local directory to upload (for --op upload)
    #[arg(long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Write a CPU profile (flamegraph) to this path on exit
    #[arg(long, env = "CPUPROFILE", value_name = "PATH")]
    pub cpuprofile: Option<PathBuf>,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output (show per-file logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Available operations
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Generate and upload data files (the default)
    Create,
    /// Upload a local directory to the configured path
    Upload,
    /// List objects at the configured path
    Show,
    /// Delete objects at the configured path
    Delete,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Upload => "upload",
            Operation::Show => "show",
            Operation::Delete => "delete",
        }
    }
}

/// Output file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Parquet,
}

impl FileFormat {
    /// File name suffix for this format
    pub fn suffix(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Parquet => "parquet",
        }
    }
}

/// `[s3]` section: credentials and addressing for S3-compatible stores
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct S3Config {
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub role_arn: String,
}

/// `[gcs]` section: service-account credentials for GCS
#[derive(Deserialize, Debug, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GcsConfig {
    #[serde(default)]
    pub credential: String,
}

/// `[common]` section
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CommonConfig {
    /// Local path, `s3://...`, or `gcs://...`
    #[serde(default)]
    pub path: String,

    /// File-name prefix
    #[serde(default)]
    pub prefix: String,

    /// <=1 disables subfolders; >1 splits output into `partNNNNN/`
    #[serde(default)]
    pub folders: u64,

    /// First file index (inclusive)
    #[serde(default)]
    pub start_fileno: u64,

    /// One past the last file index (exclusive)
    #[serde(default)]
    pub end_fileno: u64,

    /// Rows per file
    #[serde(default)]
    pub rows: u64,

    /// "csv" or "parquet" (case-insensitive)
    #[serde(default)]
    pub format: String,

    #[serde(default)]
    pub use_streaming_mode: bool,

    /// Target streaming chunk size, e.g. "16MiB" (optional)
    #[serde(default)]
    pub chunk_size: String,

    /// Derived at runtime from `chunk_size`; 0 means unset
    #[serde(skip)]
    pub chunk_size_bytes: u64,
}

/// `[parquet]` section
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ParquetConfig {
    /// Data page size, e.g. "1MiB" (default 1 MiB)
    #[serde(default)]
    pub page_size: String,

    /// Row groups per file; must divide rows
    #[serde(default)]
    pub row_groups: u64,

    /// snappy | zstd | gzip | brotli | lz4 | none
    #[serde(default)]
    pub compression: String,

    /// Derived at runtime from `page_size`
    #[serde(skip)]
    pub page_size_bytes: u64,
}

/// `[csv]` section
#[derive(Deserialize, Debug, Clone, Default)]
pub struct CsvConfig {
    #[serde(default)]
    pub base64: bool,

    /// Field separator (default ",")
    #[serde(default)]
    pub separator: String,

    /// Line terminator (default "\n")
    #[serde(default)]
    pub endline: String,
}

/// Full configuration file
#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub common: CommonConfig,
    #[serde(default)]
    pub parquet: ParquetConfig,
    #[serde(default)]
    pub csv: CsvConfig,
    pub s3: Option<S3Config>,
    pub gcs: Option<GcsConfig>,
}

impl Config {
    /// Load a config file, resolving derived byte sizes.
    ///
    /// Call [`Config::validate`] afterwards; loading only fails on I/O,
    /// TOML syntax, or unparsable size strings.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut cfg: Config = toml::from_str(&text).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        cfg.normalize()?;
        Ok(cfg)
    }

    /// Resolve derived values after deserialization.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        self.common.chunk_size_bytes = if self.common.chunk_size.is_empty() {
            0
        } else {
            parse_size(&self.common.chunk_size)?
        };

        self.parquet.page_size_bytes = if self.parquet.page_size.is_empty() {
            DEFAULT_PAGE_SIZE_BYTES
        } else {
            parse_size(&self.parquet.page_size)?
        };

        Ok(())
    }

    /// Validate the configuration, collecting every problem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errs = Vec::new();

        if self.common.path.is_empty() {
            errs.push("common.path is required".to_string());
        }
        if self.common.prefix.is_empty() {
            errs.push("common.prefix is required".to_string());
        }
        if self.common.end_fileno < self.common.start_fileno {
            errs.push("common.end_fileno must not be less than common.start_fileno".to_string());
        }
        if self.common.rows == 0 {
            errs.push("common.rows must be greater than 0".to_string());
        }

        let format = self.common.format.trim().to_lowercase();
        match format.as_str() {
            "csv" | "parquet" => {}
            _ => errs.push("common.format must be csv or parquet".to_string()),
        }

        if !self.common.chunk_size.is_empty() && self.common.chunk_size_bytes == 0 {
            errs.push("common.chunk_size must be greater than 0".to_string());
        }

        if format == "parquet" {
            let batch = crate::writer::parquet::BATCH_SIZE as u64;
            if self.parquet.row_groups == 0 {
                errs.push("parquet.row_groups must be greater than 0".to_string());
            } else if self.common.rows > 0
                && self.common.rows % (self.parquet.row_groups * batch) != 0
            {
                errs.push(format!(
                    "common.rows must be divisible by parquet.row_groups * {batch}"
                ));
            }
            if self.parquet.page_size_bytes == 0 {
                errs.push("parquet.page_size must be greater than 0".to_string());
            }
        }

        if self.s3.is_some() && self.gcs.is_some() {
            errs.push("only one of [s3] or [gcs] can be configured".to_string());
        }

        if errs.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(errs))
        }
    }

    /// Resolved output format; valid only after [`Config::validate`].
    pub fn format(&self) -> FileFormat {
        if self.common.format.trim().eq_ignore_ascii_case("csv") {
            FileFormat::Csv
        } else {
            FileFormat::Parquet
        }
    }

    /// Separator and endline for CSV output, with defaults applied.
    pub fn csv_separator_endline(&self) -> (String, String) {
        let separator = if self.csv.separator.is_empty() {
            ",".to_string()
        } else {
            self.csv.separator.clone()
        };
        let endline = if self.csv.endline.is_empty() {
            "\n".to_string()
        } else {
            self.csv.endline.clone()
        };
        (separator, endline)
    }
}

/// Validate the CLI thread count.
pub fn validate_threads(threads: usize) -> Result<(), ConfigError> {
    if threads == 0 || threads > MAX_THREADS {
        return Err(ConfigError::InvalidThreadCount {
            count: threads,
            max: MAX_THREADS,
        });
    }
    Ok(())
}

/// Parse a human-readable size string.
///
/// IEC suffixes (`KiB`, `MiB`, `GiB`, `TiB`) are 1024-based, SI suffixes
/// (`KB`, `MB`, `GB`, `TB`) are 1000-based; a bare number or a trailing `B`
/// means bytes.
pub fn parse_size(s: &str) -> Result<u64, ConfigError> {
    let trimmed = s.trim();
    let upper = trimmed.to_uppercase();

    let (num_str, multiplier) = if let Some(rest) = upper.strip_suffix("KIB") {
        (rest, 1u64 << 10)
    } else if let Some(rest) = upper.strip_suffix("MIB") {
        (rest, 1u64 << 20)
    } else if let Some(rest) = upper.strip_suffix("GIB") {
        (rest, 1u64 << 30)
    } else if let Some(rest) = upper.strip_suffix("TIB") {
        (rest, 1u64 << 40)
    } else if let Some(rest) = upper.strip_suffix("KB") {
        (rest, 1_000u64)
    } else if let Some(rest) = upper.strip_suffix("MB") {
        (rest, 1_000_000u64)
    } else if let Some(rest) = upper.strip_suffix("GB") {
        (rest, 1_000_000_000u64)
    } else if let Some(rest) = upper.strip_suffix("TB") {
        (rest, 1_000_000_000_000u64)
    } else if let Some(rest) = upper.strip_suffix('B') {
        (rest, 1u64)
    } else {
        (upper.as_str(), 1u64)
    };

    let num: f64 = num_str
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidSize {
            value: s.to_string(),
            reason: "not a number".to_string(),
        })?;

    if num < 0.0 {
        return Err(ConfigError::InvalidSize {
            value: s.to_string(),
            reason: "must not be negative".to_string(),
        });
    }

    Ok((num * multiplier as f64) as u64)
}
