//! CSV file generation
//!
//! One row is `field_0 sep field_1 sep ... sep field_{n-1} endline`, with
//! `\N` for nulls and optional per-field Base64. Direct mode writes row by
//! row from a reused buffer; streaming mode hands off chunk-sized buffers.

use crate::config::Config;
use crate::error::{Result, SchemaError, TableGenError};
use crate::schema::{ColumnSpec, SqlType};
use crate::storage::ObjectFileWriter;
use crate::writer::chunk::{ChunkCalculator, FileChunk};
use crate::writer::FormatGenerator;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use crossbeam_channel::Sender;
use rand::rngs::StdRng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Direct-mode row buffer capacity (64 KiB)
const ROW_BUFFER_CAPACITY: usize = 64 * 1024;

/// CSV format generator.
pub struct CsvGenerator {
    specs: Arc<[ColumnSpec]>,
    rows: u64,
    base64: bool,
    separator: Vec<u8>,
    endline: Vec<u8>,
    row_size: usize,
    chunk_rows: usize,
}

impl CsvGenerator {
    pub fn new(cfg: &Config, specs: Arc<[ColumnSpec]>) -> Result<Self> {
        if let Some(spec) = specs.iter().find(|s| s.sql_type == SqlType::Decimal) {
            return Err(TableGenError::Schema(SchemaError::UnsupportedType {
                column: spec.name.clone(),
                sql_type: "decimal (not supported in CSV output)".to_string(),
            }));
        }

        let (separator, endline) = cfg.csv_separator_endline();
        let calculator = ChunkCalculator::new(cfg);
        let row_size = calculator.estimate_row_size(&specs);
        let chunk_rows = calculator.chunk_rows(&specs);

        Ok(Self {
            specs,
            rows: cfg.common.rows,
            base64: cfg.csv.base64,
            separator: separator.into_bytes(),
            endline: endline.into_bytes(),
            row_size,
            chunk_rows,
        })
    }

    /// Append one formatted row to the buffer.
    fn append_row(&self, buf: &mut Vec<u8>, row_id: u64, rng: &mut StdRng) {
        for (i, spec) in self.specs.iter().enumerate() {
            let field = spec.generate_field(row_id, rng);
            if i > 0 {
                buf.extend_from_slice(&self.separator);
            }
            if self.base64 {
                buf.extend_from_slice(STANDARD.encode(field.as_bytes()).as_bytes());
            } else {
                buf.extend_from_slice(field.as_bytes());
            }
        }
        buf.extend_from_slice(&self.endline);
    }
}

impl FormatGenerator for CsvGenerator {
    fn file_suffix(&self) -> &'static str {
        "csv"
    }

    fn generate_file(&self, writer: &mut dyn ObjectFileWriter, file_no: u64) -> Result<()> {
        let mut rng = crate::schema::datagen::file_rng();
        let mut buffer = Vec::with_capacity(ROW_BUFFER_CAPACITY);
        let start_row_id = file_no * self.rows;

        for i in 0..self.rows {
            buffer.clear();
            self.append_row(&mut buffer, start_row_id + i, &mut rng);
            writer.write_all(&buffer)?;
        }

        Ok(())
    }

    fn generate_streaming(
        &self,
        file_no: u64,
        chunks: &Sender<FileChunk>,
        shutdown: &Arc<AtomicBool>,
    ) -> Result<()> {
        let mut rng = crate::schema::datagen::file_rng();
        let start_row_id = file_no * self.rows;
        let total_rows = self.rows;
        let chunk_rows = self.chunk_rows as u64;
        let buffer_size = self.row_size * self.chunk_rows * 3 / 2;

        let mut row_offset = 0u64;
        while row_offset < total_rows {
            if shutdown.load(Ordering::Relaxed) {
                return Err(TableGenError::Interrupted);
            }

            let rows_in_chunk = chunk_rows.min(total_rows - row_offset);
            let is_last = row_offset + chunk_rows >= total_rows;

            let mut buffer = Vec::with_capacity(buffer_size);
            for i in 0..rows_in_chunk {
                self.append_row(&mut buffer, start_row_id + row_offset + i, &mut rng);
            }

            chunks
                .send(FileChunk {
                    data: buffer,
                    is_last,
                })
                .map_err(|_| TableGenError::ChannelClosed)?;

            row_offset += chunk_rows;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommonConfig, Config, CsvConfig};
    use crate::schema::ddl::parse_create_table;
    use crate::schema::spec::build_specs;
    use crossbeam_channel::bounded;

    fn csv_config(rows: u64) -> Config {
        Config {
            common: CommonConfig {
                format: "csv".to_string(),
                rows,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn specs(sql: &str) -> Arc<[ColumnSpec]> {
        build_specs(&parse_create_table(sql).unwrap())
            .unwrap()
            .into()
    }

    /// In-memory writer collecting everything written.
    struct VecWriter(Vec<u8>);

    impl ObjectFileWriter for VecWriter {
        fn write(&mut self, data: &[u8]) -> crate::error::StorageResult<usize> {
            self.0.extend_from_slice(data);
            Ok(data.len())
        }
        fn close(&mut self) -> crate::error::StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_direct_rows_and_ids() {
        let generator = csv_generator(csv_config(100), "CREATE TABLE t (id BIGINT PRIMARY KEY, v VARCHAR(10));");
        let mut writer = VecWriter(Vec::new());
        generator.generate_file(&mut writer, 1).unwrap();

        let text = String::from_utf8(writer.0).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 100);
        for (k, line) in lines.iter().enumerate() {
            let (id, rest) = line.split_once(',').unwrap();
            assert_eq!(id.parse::<u64>().unwrap(), 100 + k as u64);
            assert!(rest.len() >= 7 && rest.len() <= 10);
        }
    }

    fn csv_generator(cfg: Config, sql: &str) -> CsvGenerator {
        CsvGenerator::new(&cfg, specs(sql)).unwrap()
    }

    #[test]
    fn test_custom_separator_endline() {
        let mut cfg = csv_config(3);
        cfg.csv = CsvConfig {
            base64: false,
            separator: "|".to_string(),
            endline: "\r\n".to_string(),
        };
        let generator = csv_generator(cfg, "CREATE TABLE t (a INT COMMENT 'set=[5]', b INT COMMENT 'set=[6]');");
        let mut writer = VecWriter(Vec::new());
        generator.generate_file(&mut writer, 0).unwrap();
        assert_eq!(String::from_utf8(writer.0).unwrap(), "5|6\r\n".repeat(3));
    }

    #[test]
    fn test_base64_round_trip() {
        let mut cfg = csv_config(5);
        cfg.csv.base64 = true;
        let generator = csv_generator(cfg, "CREATE TABLE t (x INT COMMENT 'set=[12]', y VARCHAR(4) COMMENT 'set=[\"ab\"]');");
        let mut writer = VecWriter(Vec::new());
        generator.generate_file(&mut writer, 0).unwrap();

        let text = String::from_utf8(writer.0).unwrap();
        for line in text.lines() {
            let decoded: Vec<String> = line
                .split(',')
                .map(|f| String::from_utf8(STANDARD.decode(f).unwrap()).unwrap())
                .collect();
            assert_eq!(decoded, vec!["12", "ab"]);
        }
    }

    #[test]
    fn test_decimal_rejected() {
        let cfg = csv_config(10);
        let result = CsvGenerator::new(&cfg, specs("CREATE TABLE t (d DECIMAL(5,2));"));
        assert!(result.is_err());
    }

    #[test]
    fn test_streaming_chunks_concatenate_to_full_file() {
        let mut cfg = csv_config(1000);
        cfg.common.chunk_size = "1KiB".to_string();
        cfg.normalize().unwrap();
        let generator = csv_generator(cfg, "CREATE TABLE t (id BIGINT PRIMARY KEY);");

        let (tx, rx) = bounded::<FileChunk>(1024);
        let shutdown = Arc::new(AtomicBool::new(false));
        generator.generate_streaming(0, &tx, &shutdown).unwrap();
        drop(tx);

        let mut all = Vec::new();
        let mut saw_last = false;
        for chunk in rx.iter() {
            assert!(!saw_last, "chunk after is_last");
            saw_last = chunk.is_last;
            all.extend_from_slice(&chunk.data);
        }
        assert!(saw_last);

        let text = String::from_utf8(all).unwrap();
        let ids: Vec<u64> = text.lines().map(|l| l.parse().unwrap()).collect();
        assert_eq!(ids, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_streaming_shutdown_interrupts() {
        let mut cfg = csv_config(100_000);
        cfg.common.chunk_size = "1KiB".to_string();
        cfg.normalize().unwrap();
        let generator = csv_generator(cfg, "CREATE TABLE t (id BIGINT PRIMARY KEY);");

        let (tx, _rx) = bounded::<FileChunk>(1024);
        let shutdown = Arc::new(AtomicBool::new(true));
        let err = generator.generate_streaming(0, &tx, &shutdown).unwrap_err();
        assert!(matches!(err, TableGenError::Interrupted));
    }
}
