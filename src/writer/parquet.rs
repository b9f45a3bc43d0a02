//! Parquet file generation
//!
//! Drives the low-level column-chunk writers directly: every column is an
//! optional primitive node, values flow in fixed-size batches with
//! definition levels, and encodings are chosen per column from the spec
//! (dictionary for explicit value sets, delta packing for ordered integers,
//! byte-stream-split for floats and fixed-len decimals, delta-length for
//! random strings). One codec from the config compresses every column.
//!
//! Streaming mode routes the serialized bytes through a [`ChunkSink`] that
//! slices them into uploader chunks without rebuffering the whole file.

use crate::config::Config;
use crate::error::{Result, TableGenError};
use crate::schema::{BatchValues, ColumnSpec, NumericOrder};
use crate::storage::ObjectFileWriter;
use crate::writer::chunk::FileChunk;
use crate::writer::FormatGenerator;
use crossbeam_channel::Sender;
use parquet::basic::{
    BrotliLevel, Compression, ConvertedType, Encoding, GzipLevel, Type as PhysicalType, ZstdLevel,
};
use parquet::data_type::{
    ByteArrayType, DoubleType, FixedLenByteArrayType, FloatType, Int32Type, Int64Type,
};
use parquet::errors::ParquetError;
use parquet::file::properties::{WriterProperties, WriterVersion};
use parquet::file::writer::SerializedFileWriter;
use parquet::schema::types::{ColumnPath, Type, TypePtr};
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Rows per write_batch call. Row groups must hold a whole number of
/// batches, which config validation enforces up front.
pub const BATCH_SIZE: usize = 50;

/// Default streaming chunk target for Parquet (8 MiB)
const DEFAULT_PARQUET_CHUNK_SIZE: u64 = 8 << 20;

/// Parquet format generator.
pub struct ParquetGenerator {
    specs: Arc<[ColumnSpec]>,
    rows: u64,
    row_groups: u64,
    page_size: usize,
    codec: Compression,
    chunk_size: usize,
}

impl ParquetGenerator {
    pub fn new(cfg: &Config, specs: Arc<[ColumnSpec]>) -> Result<Self> {
        let codec = compression_codec(&cfg.parquet.compression)?;

        let chunk_size = if cfg.common.chunk_size_bytes > 0 {
            cfg.common.chunk_size_bytes
        } else {
            DEFAULT_PARQUET_CHUNK_SIZE
        };

        Ok(Self {
            specs,
            rows: cfg.common.rows,
            row_groups: cfg.parquet.row_groups,
            page_size: cfg.parquet.page_size_bytes as usize,
            codec,
            chunk_size: chunk_size as usize,
        })
    }

    /// Schema group node with one optional primitive per column.
    fn build_schema(&self) -> Result<TypePtr> {
        let mut fields = Vec::with_capacity(self.specs.len());
        for spec in self.specs.iter() {
            fields.push(schema_node(spec)?);
        }
        let group = Type::group_type_builder("schema")
            .with_fields(fields)
            .build()?;
        Ok(Arc::new(group))
    }

    fn writer_properties(&self) -> WriterProperties {
        let mut builder = WriterProperties::builder()
            .set_writer_version(WriterVersion::PARQUET_2_0)
            .set_data_page_size_limit(self.page_size)
            .set_compression(self.codec);

        for spec in self.specs.iter() {
            let path = ColumnPath::from(spec.name.as_str());
            let (encoding, use_dictionary) = choose_encoding(spec);
            builder = builder.set_column_dictionary_enabled(path.clone(), use_dictionary);
            if !use_dictionary {
                builder = builder.set_column_encoding(path, encoding);
            }
        }

        builder.build()
    }

    /// Write one complete file into the sink and hand the sink back.
    fn write_file<W: Write + Send>(&self, sink: W, file_no: u64) -> Result<W> {
        let schema = self.build_schema()?;
        let props = Arc::new(self.writer_properties());
        let mut writer = SerializedFileWriter::new(sink, schema, props)?;

        let rows_per_group = self.rows / self.row_groups;
        let rounds = rows_per_group / BATCH_SIZE as u64;
        let mut rng = crate::schema::datagen::file_rng();
        let mut group_start = file_no * self.rows;

        for _ in 0..self.row_groups {
            let mut row_group = writer.next_row_group()?;

            for spec in self.specs.iter() {
                let mut column = row_group.next_column()?.ok_or_else(|| {
                    ParquetError::General(format!("missing column writer for '{}'", spec.name))
                })?;

                let mut values = BatchValues::for_physical(spec.physical, BATCH_SIZE)?;
                let mut def_levels: Vec<i16> = Vec::with_capacity(BATCH_SIZE);
                let mut row_id = group_start;

                for _ in 0..rounds {
                    spec.fill_batch(row_id, BATCH_SIZE, &mut values, &mut def_levels, &mut rng)?;

                    match &values {
                        BatchValues::Int32(v) => {
                            column
                                .typed::<Int32Type>()
                                .write_batch(v, Some(&def_levels), None)?;
                        }
                        BatchValues::Int64(v) => {
                            column
                                .typed::<Int64Type>()
                                .write_batch(v, Some(&def_levels), None)?;
                        }
                        BatchValues::Float(v) => {
                            column
                                .typed::<FloatType>()
                                .write_batch(v, Some(&def_levels), None)?;
                        }
                        BatchValues::Double(v) => {
                            column
                                .typed::<DoubleType>()
                                .write_batch(v, Some(&def_levels), None)?;
                        }
                        BatchValues::Bytes(v) => {
                            column
                                .typed::<ByteArrayType>()
                                .write_batch(v, Some(&def_levels), None)?;
                        }
                        BatchValues::FixedBytes(v) => {
                            column
                                .typed::<FixedLenByteArrayType>()
                                .write_batch(v, Some(&def_levels), None)?;
                        }
                    }

                    row_id += BATCH_SIZE as u64;
                }

                column.close()?;
            }

            row_group.close()?;
            group_start += rows_per_group;
        }

        Ok(writer.into_inner()?)
    }
}

impl FormatGenerator for ParquetGenerator {
    fn file_suffix(&self) -> &'static str {
        "parquet"
    }

    fn generate_file(&self, writer: &mut dyn ObjectFileWriter, file_no: u64) -> Result<()> {
        let adapter = StoreWriteAdapter { inner: writer };
        self.write_file(adapter, file_no)?;
        Ok(())
    }

    fn generate_streaming(
        &self,
        file_no: u64,
        chunks: &Sender<FileChunk>,
        shutdown: &Arc<AtomicBool>,
    ) -> Result<()> {
        let sink = ChunkSink::new(chunks.clone(), self.chunk_size, Arc::clone(shutdown));
        let sink = match self.write_file(sink, file_no) {
            Ok(sink) => sink,
            Err(e) => {
                if shutdown.load(Ordering::Relaxed) {
                    return Err(TableGenError::Interrupted);
                }
                return Err(e);
            }
        };
        sink.finish()
    }
}

/// Build the schema node for one column.
fn schema_node(spec: &ColumnSpec) -> Result<TypePtr> {
    let mut builder = Type::primitive_type_builder(&spec.name, spec.physical)
        .with_repetition(parquet::basic::Repetition::OPTIONAL)
        .with_converted_type(spec.converted);

    if spec.physical == PhysicalType::FIXED_LEN_BYTE_ARRAY {
        builder = builder.with_length(spec.type_len as i32);
    }
    if spec.converted == ConvertedType::DECIMAL {
        builder = builder
            .with_precision(spec.precision)
            .with_scale(spec.scale);
    }

    Ok(Arc::new(builder.build()?))
}

/// Pick the value encoding and dictionary choice for a column.
fn choose_encoding(spec: &ColumnSpec) -> (Encoding, bool) {
    let has_explicit_set = !spec.value_set.is_empty() || !spec.int_set.is_empty();
    if has_explicit_set && !spec.is_unique {
        return (Encoding::PLAIN, true);
    }

    match spec.physical {
        PhysicalType::INT32 | PhysicalType::INT64 => {
            if spec.order == NumericOrder::Total || spec.order == NumericOrder::Partial {
                (Encoding::DELTA_BINARY_PACKED, false)
            } else {
                (Encoding::PLAIN, false)
            }
        }
        PhysicalType::FLOAT | PhysicalType::DOUBLE => (Encoding::BYTE_STREAM_SPLIT, false),
        PhysicalType::FIXED_LEN_BYTE_ARRAY => (Encoding::BYTE_STREAM_SPLIT, false),
        PhysicalType::BYTE_ARRAY => {
            if spec.is_unique {
                (Encoding::PLAIN, false)
            } else {
                (Encoding::DELTA_LENGTH_BYTE_ARRAY, false)
            }
        }
        _ => (Encoding::PLAIN, false),
    }
}

/// Map a config codec name onto a Parquet compression.
fn compression_codec(name: &str) -> Result<Compression> {
    let codec = match name.trim().to_lowercase().as_str() {
        "snappy" => Compression::SNAPPY,
        "zstd" => Compression::ZSTD(ZstdLevel::default()),
        "gzip" => Compression::GZIP(GzipLevel::default()),
        "brotli" => Compression::BROTLI(BrotliLevel::default()),
        "lz4" | "lz4_raw" => Compression::LZ4_RAW,
        "none" | "uncompressed" => Compression::UNCOMPRESSED,
        other => {
            return Err(TableGenError::Parquet(ParquetError::General(format!(
                "unsupported parquet compression: {other:?}"
            ))))
        }
    };
    Ok(codec)
}

/// io::Write adapter over an object-file writer for direct mode.
struct StoreWriteAdapter<'a> {
    inner: &'a mut dyn ObjectFileWriter,
}

impl Write for StoreWriteAdapter<'_> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.inner
            .write(buf)
            .map_err(|e| std::io::Error::other(e.to_string()))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Buffering sink that turns serialized writes into uploader chunks.
///
/// Sends a chunk whenever `chunk_size` unsent bytes accumulate, compacts the
/// buffer once four chunks' worth has been shipped, and flushes the
/// remainder with `is_last` on [`ChunkSink::finish`].
pub(crate) struct ChunkSink {
    chunks: Sender<FileChunk>,
    buffer: Vec<u8>,
    last_sent: usize,
    chunk_size: usize,
    shutdown: Arc<AtomicBool>,
}

impl ChunkSink {
    pub(crate) fn new(
        chunks: Sender<FileChunk>,
        chunk_size: usize,
        shutdown: Arc<AtomicBool>,
    ) -> Self {
        Self {
            chunks,
            buffer: Vec::with_capacity(chunk_size.saturating_mul(2)),
            last_sent: 0,
            chunk_size,
            shutdown,
        }
    }

    /// Send the unsent tail (possibly empty) as the terminal chunk.
    pub(crate) fn finish(mut self) -> Result<()> {
        let tail = self.buffer.split_off(self.last_sent);
        self.chunks
            .send(FileChunk {
                data: tail,
                is_last: true,
            })
            .map_err(|_| TableGenError::ChannelClosed)
    }
}

impl Write for ChunkSink {
    fn write(&mut self, data: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(data);

        while self.buffer.len() - self.last_sent >= self.chunk_size {
            if self.shutdown.load(Ordering::Relaxed) {
                return Err(std::io::Error::new(
                    std::io::ErrorKind::Interrupted,
                    "shutdown requested",
                ));
            }

            let chunk = self.buffer[self.last_sent..self.last_sent + self.chunk_size].to_vec();
            self.chunks
                .send(FileChunk {
                    data: chunk,
                    is_last: false,
                })
                .map_err(|_| {
                    std::io::Error::new(std::io::ErrorKind::BrokenPipe, "uploader went away")
                })?;
            self.last_sent += self.chunk_size;
        }

        // Drop shipped bytes once enough accumulate to bound memory
        if self.last_sent >= self.chunk_size * 4 {
            self.buffer.drain(..self.last_sent);
            self.last_sent = 0;
        }

        Ok(data.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CommonConfig, Config, ParquetConfig};
    use crate::schema::ddl::parse_create_table;
    use crate::schema::spec::build_specs;
    use crossbeam_channel::bounded;

    fn parquet_config(rows: u64, row_groups: u64, compression: &str) -> Config {
        let mut cfg = Config {
            common: CommonConfig {
                format: "parquet".to_string(),
                rows,
                ..Default::default()
            },
            parquet: ParquetConfig {
                row_groups,
                compression: compression.to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        cfg.normalize().unwrap();
        cfg
    }

    fn specs(sql: &str) -> Arc<[ColumnSpec]> {
        build_specs(&parse_create_table(sql).unwrap())
            .unwrap()
            .into()
    }

    #[test]
    fn test_choose_encoding_rules() {
        let specs = specs(
            "CREATE TABLE t (
                a INT COMMENT 'set=[1,2]',
                b BIGINT COMMENT 'order=total_order',
                c BIGINT,
                d DOUBLE,
                e DECIMAL(20,5),
                f VARCHAR(10) PRIMARY KEY,
                g VARCHAR(10)
            );",
        );

        assert_eq!(choose_encoding(&specs[0]), (Encoding::PLAIN, true));
        assert_eq!(
            choose_encoding(&specs[1]),
            (Encoding::DELTA_BINARY_PACKED, false)
        );
        // Random order integers stay plain
        assert_eq!(choose_encoding(&specs[2]), (Encoding::PLAIN, false));
        assert_eq!(
            choose_encoding(&specs[3]),
            (Encoding::BYTE_STREAM_SPLIT, false)
        );
        assert_eq!(
            choose_encoding(&specs[4]),
            (Encoding::BYTE_STREAM_SPLIT, false)
        );
        assert_eq!(choose_encoding(&specs[5]), (Encoding::PLAIN, false));
        assert_eq!(
            choose_encoding(&specs[6]),
            (Encoding::DELTA_LENGTH_BYTE_ARRAY, false)
        );
    }

    #[test]
    fn test_unique_int_with_set_still_uses_dictionary_rule() {
        let specs = specs("CREATE TABLE t (a INT PRIMARY KEY COMMENT 'set=[1,2]');");
        // Unique disables the dictionary shortcut; order promotion applies
        let (encoding, dict) = choose_encoding(&specs[0]);
        assert!(!dict);
        assert_eq!(encoding, Encoding::PLAIN);
    }

    #[test]
    fn test_compression_codec_names() {
        assert!(matches!(
            compression_codec("snappy").unwrap(),
            Compression::SNAPPY
        ));
        assert!(matches!(
            compression_codec("ZSTD").unwrap(),
            Compression::ZSTD(_)
        ));
        assert!(matches!(
            compression_codec(" lz4 ").unwrap(),
            Compression::LZ4_RAW
        ));
        assert!(matches!(
            compression_codec("none").unwrap(),
            Compression::UNCOMPRESSED
        ));
        assert!(compression_codec("deflate64").is_err());
    }

    #[test]
    fn test_write_file_produces_parquet_magic() {
        let cfg = parquet_config(200, 2, "snappy");
        let generator =
            ParquetGenerator::new(&cfg, specs("CREATE TABLE t (id BIGINT PRIMARY KEY, v VARCHAR(10), d DECIMAL(20,5), ts TIMESTAMP);"))
                .unwrap();

        let sink = generator.write_file(Vec::new(), 0).unwrap();
        assert!(sink.len() > 8);
        assert_eq!(&sink[..4], b"PAR1");
        assert_eq!(&sink[sink.len() - 4..], b"PAR1");
    }

    #[test]
    fn test_write_file_all_codecs() {
        for codec in ["snappy", "zstd", "gzip", "brotli", "lz4", "none"] {
            let cfg = parquet_config(50, 1, codec);
            let generator =
                ParquetGenerator::new(&cfg, specs("CREATE TABLE t (a INT, s VARCHAR(8));"))
                    .unwrap();
            let sink = generator.write_file(Vec::new(), 0).unwrap();
            assert_eq!(&sink[..4], b"PAR1", "codec {codec}");
        }
    }

    #[test]
    fn test_streaming_chunks_reassemble_exactly() {
        let mut cfg = parquet_config(500, 1, "none");
        cfg.common.chunk_size = "1KiB".to_string();
        cfg.normalize().unwrap();

        let column_specs = specs("CREATE TABLE t (id BIGINT PRIMARY KEY, v VARCHAR(20));");
        let generator = ParquetGenerator::new(&cfg, Arc::clone(&column_specs)).unwrap();

        let (tx, rx) = bounded::<FileChunk>(4096);
        let shutdown = Arc::new(AtomicBool::new(false));
        generator.generate_streaming(0, &tx, &shutdown).unwrap();
        drop(tx);

        let mut streamed = Vec::new();
        let mut saw_last = false;
        for chunk in rx.iter() {
            assert!(!saw_last);
            if !chunk.is_last {
                assert_eq!(chunk.data.len(), 1024);
            }
            saw_last = chunk.is_last;
            streamed.extend_from_slice(&chunk.data);
        }
        assert!(saw_last);
        assert_eq!(&streamed[..4], b"PAR1");
        assert_eq!(&streamed[streamed.len() - 4..], b"PAR1");
    }

    #[test]
    fn test_chunk_sink_protocol() {
        let (tx, rx) = bounded::<FileChunk>(64);
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut sink = ChunkSink::new(tx, 10, shutdown);

        sink.write_all(&[1u8; 35]).unwrap();
        // 3 full chunks shipped, 5 bytes pending
        assert_eq!(rx.len(), 3);
        sink.write_all(&[2u8; 10]).unwrap();
        sink.finish().unwrap();

        let chunks: Vec<FileChunk> = rx.iter().collect();
        assert_eq!(chunks.len(), 5);
        assert!(chunks[..4].iter().all(|c| !c.is_last && c.data.len() == 10));
        assert!(chunks[4].is_last);
        assert_eq!(chunks[4].data.len(), 5);

        let total: Vec<u8> = chunks.into_iter().flat_map(|c| c.data).collect();
        assert_eq!(total.len(), 45);
        assert_eq!(&total[..35], &[1u8; 35][..]);
        assert_eq!(&total[35..], &[2u8; 10][..]);
    }

    #[test]
    fn test_chunk_sink_empty_final_chunk() {
        let (tx, rx) = bounded::<FileChunk>(8);
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut sink = ChunkSink::new(tx, 10, shutdown);

        sink.write_all(&[7u8; 20]).unwrap();
        sink.finish().unwrap();

        let chunks: Vec<FileChunk> = rx.iter().collect();
        assert_eq!(chunks.len(), 3);
        assert!(chunks[2].is_last);
        assert!(chunks[2].data.is_empty());
    }

    #[test]
    fn test_chunk_sink_closed_channel_is_broken_pipe() {
        let (tx, rx) = bounded::<FileChunk>(1);
        drop(rx);
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut sink = ChunkSink::new(tx, 4, shutdown);
        let err = sink.write_all(&[0u8; 8]).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe);
    }
}
