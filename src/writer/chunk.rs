//! Streaming chunks and row-count estimation

use crate::config::{Config, FileFormat};
use crate::schema::{ColumnSpec, SqlType};

/// Default streaming chunk target for CSV (32 KiB)
const DEFAULT_CHUNK_SIZE: u64 = 32 * 1024;

/// One chunk of a file in flight from producer to uploader.
///
/// `is_last` marks the terminal chunk; its payload may be empty.
#[derive(Debug)]
pub struct FileChunk {
    pub data: Vec<u8>,
    pub is_last: bool,
}

/// Estimates serialized row sizes and derives rows-per-chunk so a chunk
/// lands near the configured byte target.
pub struct ChunkCalculator {
    format: FileFormat,
    separator_len: usize,
    endline_len: usize,
    target_bytes: u64,
}

impl ChunkCalculator {
    pub fn new(cfg: &Config) -> Self {
        let (separator, endline) = cfg.csv_separator_endline();
        let target_bytes = if cfg.common.chunk_size_bytes > 0 {
            cfg.common.chunk_size_bytes
        } else {
            DEFAULT_CHUNK_SIZE
        };
        Self {
            format: cfg.format(),
            separator_len: separator.len(),
            endline_len: endline.len(),
            target_bytes,
        }
    }

    /// Approximate serialized size of one row in bytes.
    pub fn estimate_row_size(&self, specs: &[ColumnSpec]) -> usize {
        let mut total = 0usize;

        for spec in specs {
            total += match spec.sql_type {
                SqlType::BigInt | SqlType::Timestamp | SqlType::Datetime => 8,
                SqlType::Int | SqlType::MediumInt | SqlType::Date => 4,
                SqlType::SmallInt => 2,
                SqlType::TinyInt => 1,
                SqlType::Float => 4,
                SqlType::Double => 8,
                t if t.is_string_like() => {
                    if spec.type_len > 0 {
                        spec.type_len as usize
                    } else {
                        32
                    }
                }
                _ => 16,
            };
        }

        match self.format {
            FileFormat::Csv => {
                let mut overhead = self.endline_len;
                if !specs.is_empty() {
                    overhead += (specs.len() - 1) * self.separator_len;
                }
                total + overhead
            }
            // Encoding overhead fudge
            FileFormat::Parquet => (total as f64 * 1.2) as usize,
        }
    }

    /// Rows per chunk targeting the configured chunk byte size; at least 1.
    pub fn chunk_rows(&self, specs: &[ColumnSpec]) -> usize {
        let mut row_size = self.estimate_row_size(specs);
        if row_size == 0 {
            row_size = 100;
        }
        ((self.target_bytes as usize) / row_size).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommonConfig, Config};
    use crate::schema::ddl::parse_create_table;
    use crate::schema::spec::build_specs;

    fn config(format: &str, chunk_size_bytes: u64) -> Config {
        Config {
            common: CommonConfig {
                format: format.to_string(),
                chunk_size_bytes,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn specs(sql: &str) -> Vec<ColumnSpec> {
        build_specs(&parse_create_table(sql).unwrap()).unwrap()
    }

    #[test]
    fn test_csv_row_size_includes_delimiters() {
        let calc = ChunkCalculator::new(&config("csv", 0));
        let specs = specs("CREATE TABLE t (id BIGINT, v VARCHAR(10));");
        // 8 + 10 + one separator + one endline
        assert_eq!(calc.estimate_row_size(&specs), 20);
    }

    #[test]
    fn test_parquet_row_size_overhead() {
        let calc = ChunkCalculator::new(&config("parquet", 0));
        let specs = specs("CREATE TABLE t (id BIGINT, n INT);");
        // (8 + 4) * 1.2
        assert_eq!(calc.estimate_row_size(&specs), 14);
    }

    #[test]
    fn test_chunk_rows_default_target() {
        let calc = ChunkCalculator::new(&config("csv", 0));
        let specs = specs("CREATE TABLE t (id BIGINT, v VARCHAR(10));");
        assert_eq!(calc.chunk_rows(&specs), 32 * 1024 / 20);
    }

    #[test]
    fn test_chunk_rows_at_least_one() {
        let calc = ChunkCalculator::new(&config("csv", 1));
        let specs = specs("CREATE TABLE t (v VARCHAR(64));");
        assert_eq!(calc.chunk_rows(&specs), 1);
    }

    #[test]
    fn test_custom_chunk_size() {
        let calc = ChunkCalculator::new(&config("csv", 1000));
        let specs = specs("CREATE TABLE t (a INT);");
        // Row: 4 + endline 1 = 5 bytes
        assert_eq!(calc.chunk_rows(&specs), 200);
    }
}
