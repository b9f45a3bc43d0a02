//! Integration tests for tablegen
//!
//! End-to-end generation runs against the local filesystem store, checking
//! file naming, row counts, key uniqueness, and streaming/direct agreement.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tablegen::config::{CommonConfig, Config, CsvConfig, ParquetConfig};
use tablegen::progress::ProgressLogger;
use tablegen::schema;
use tablegen::writer::FileGenerator;
use tempfile::tempdir;

fn csv_config(path: &Path, rows: u64, start: u64, end: u64) -> Config {
    Config {
        common: CommonConfig {
            path: path.display().to_string(),
            prefix: "t".to_string(),
            folders: 0,
            start_fileno: start,
            end_fileno: end,
            rows,
            format: "csv".to_string(),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn parquet_config(path: &Path, rows: u64, row_groups: u64) -> Config {
    let mut cfg = Config {
        common: CommonConfig {
            path: path.display().to_string(),
            prefix: "t".to_string(),
            start_fileno: 0,
            end_fileno: 1,
            rows,
            format: "parquet".to_string(),
            ..Default::default()
        },
        parquet: ParquetConfig {
            row_groups,
            compression: "snappy".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    cfg.normalize().unwrap();
    cfg
}

fn specs_for(sql: &str) -> Vec<tablegen::ColumnSpec> {
    let table = tablegen::schema::ddl::parse_create_table(sql).unwrap();
    schema::build_specs(&table).unwrap()
}

fn run(cfg: Config, sql: &str, threads: usize) -> tablegen::Result<()> {
    cfg.validate()?;
    let generator = FileGenerator::new(
        cfg,
        specs_for(sql),
        ProgressLogger::disabled(),
        Arc::new(AtomicBool::new(false)),
    )?;
    generator.run(threads)
}

#[test]
fn test_csv_two_files_with_sequential_ids() {
    let dir = tempdir().unwrap();
    let cfg = csv_config(dir.path(), 100, 0, 2);
    run(cfg, "CREATE TABLE t (id BIGINT PRIMARY KEY, name VARCHAR(10));", 2).unwrap();

    for file_no in 0..2u64 {
        let text =
            std::fs::read_to_string(dir.path().join(format!("t.{file_no}.csv"))).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 100);

        for (k, line) in lines.iter().enumerate() {
            let (id, name) = line.split_once(',').unwrap();
            assert_eq!(id.parse::<u64>().unwrap(), file_no * 100 + k as u64);
            assert!(
                name.len() >= 7 && name.len() <= 10,
                "name length {}",
                name.len()
            );
            assert!(name.bytes().all(|b| (b'!'..=b'~').contains(&b)));
        }
    }
}

#[test]
fn test_csv_value_sets_constrain_output() {
    let dir = tempdir().unwrap();
    let cfg = csv_config(dir.path(), 50, 0, 1);
    run(
        cfg,
        r#"CREATE TABLE t (x INT COMMENT 'set=[1,2,3]', y VARCHAR(5) COMMENT 'set=["a","b"]');"#,
        1,
    )
    .unwrap();

    let text = std::fs::read_to_string(dir.path().join("t.0.csv")).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 50);
    for line in lines {
        let (x, y) = line.split_once(',').unwrap();
        assert!(["1", "2", "3"].contains(&x), "x = {x}");
        assert!(["a", "b"].contains(&y), "y = {y}");
    }
}

#[test]
fn test_csv_null_percent_fraction() {
    let dir = tempdir().unwrap();
    let cfg = csv_config(dir.path(), 10_000, 0, 1);
    run(cfg, "CREATE TABLE t (a INT COMMENT 'null_percent=50');", 1).unwrap();

    let text = std::fs::read_to_string(dir.path().join("t.0.csv")).unwrap();
    let nulls = text.lines().filter(|l| *l == "\\N").count();
    assert!((4_500..=5_500).contains(&nulls), "null count {nulls}");
}

#[test]
fn test_csv_streaming_matches_direct_for_deterministic_schema() {
    let sql = "CREATE TABLE t (id BIGINT PRIMARY KEY, k INT COMMENT 'order=total_order');";

    let direct_dir = tempdir().unwrap();
    run(csv_config(direct_dir.path(), 500, 0, 1), sql, 1).unwrap();

    let streaming_dir = tempdir().unwrap();
    let mut cfg = csv_config(streaming_dir.path(), 500, 0, 1);
    cfg.common.use_streaming_mode = true;
    cfg.common.chunk_size = "1KiB".to_string();
    cfg.normalize().unwrap();
    run(cfg, sql, 1).unwrap();

    let direct = std::fs::read(direct_dir.path().join("t.0.csv")).unwrap();
    let streamed = std::fs::read(streaming_dir.path().join("t.0.csv")).unwrap();
    assert_eq!(direct, streamed);
}

#[test]
fn test_folder_partitioning_streaming() {
    let dir = tempdir().unwrap();
    let mut cfg = csv_config(dir.path(), 100, 0, 16);
    cfg.common.folders = 4;
    cfg.common.use_streaming_mode = true;
    run(cfg, "CREATE TABLE t (id BIGINT PRIMARY KEY);", 4).unwrap();

    for folder in 0..4u64 {
        for i in 0..4u64 {
            let file_no = folder + i * 4;
            let path = dir
                .path()
                .join(format!("part{folder:05}"))
                .join(format!("t.{file_no}.csv"));
            assert!(path.exists(), "missing {}", path.display());
        }
    }
}

#[test]
fn test_empty_file_range_creates_nothing() {
    let dir = tempdir().unwrap();
    let cfg = csv_config(dir.path(), 100, 5, 5);
    run(cfg, "CREATE TABLE t (id BIGINT PRIMARY KEY);", 4).unwrap();
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_parquet_file_has_magic_and_content() {
    let dir = tempdir().unwrap();
    let cfg = parquet_config(dir.path(), 200, 2);
    run(
        cfg,
        "CREATE TABLE t (id BIGINT PRIMARY KEY, v VARCHAR(16), d DECIMAL(20,5), ts TIMESTAMP);",
        1,
    )
    .unwrap();

    let bytes = std::fs::read(dir.path().join("t.0.parquet")).unwrap();
    assert!(bytes.len() > 100);
    assert_eq!(&bytes[..4], b"PAR1");
    assert_eq!(&bytes[bytes.len() - 4..], b"PAR1");
}

#[test]
fn test_parquet_streaming_produces_identical_structure() {
    let dir = tempdir().unwrap();
    let mut cfg = parquet_config(dir.path(), 100, 1);
    cfg.common.use_streaming_mode = true;
    cfg.common.chunk_size = "1KiB".to_string();
    cfg.normalize().unwrap();
    run(cfg, "CREATE TABLE t (id BIGINT PRIMARY KEY, v VARCHAR(16));", 2).unwrap();

    let bytes = std::fs::read(dir.path().join("t.0.parquet")).unwrap();
    assert_eq!(&bytes[..4], b"PAR1");
    assert_eq!(&bytes[bytes.len() - 4..], b"PAR1");
}

#[test]
fn test_parquet_row_group_misalignment_rejected() {
    let dir = tempdir().unwrap();

    // 40 rows cannot hold one batch-aligned row group
    let cfg = parquet_config(dir.path(), 40, 1);
    assert!(cfg.validate().is_err());

    // 150 rows split into 2 groups of 75 is not batch aligned either
    let cfg = parquet_config(dir.path(), 150, 2);
    assert!(cfg.validate().is_err());

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_csv_base64_round_trip() {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;

    let dir = tempdir().unwrap();
    let mut cfg = csv_config(dir.path(), 20, 0, 1);
    cfg.csv = CsvConfig {
        base64: true,
        ..Default::default()
    };
    run(cfg, "CREATE TABLE t (id BIGINT PRIMARY KEY, v INT COMMENT 'set=[9]');", 1).unwrap();

    let text = std::fs::read_to_string(dir.path().join("t.0.csv")).unwrap();
    for (k, line) in text.lines().enumerate() {
        let fields: Vec<String> = line
            .split(',')
            .map(|f| String::from_utf8(STANDARD.decode(f).unwrap()).unwrap())
            .collect();
        assert_eq!(fields[0], k.to_string());
        assert_eq!(fields[1], "9");
    }
}
