//! Schema derivation and value generation
//!
//! This module turns a `CREATE TABLE` statement into per-column generation
//! specs and produces the actual values:
//!
//! - `ddl`: SQL file cleanup and CREATE TABLE parsing into [`TableInfo`]
//! - `spec`: [`ColumnSpec`] templates, comment options, spec building
//! - `decimal`: decimal physical-type deduction and fixed-len encoding
//! - `datagen`: scalar value production (the CSV path)
//! - `batch`: Parquet batch fillers (dense values + definition levels)
//! - `display`: human-readable spec tables for `--show-spec`

pub mod batch;
pub mod datagen;
pub mod decimal;
pub mod ddl;
pub mod display;
pub mod spec;

pub use batch::BatchValues;
pub use ddl::{ColumnInfo, IndexInfo, TableInfo};
pub use spec::{build_specs, ColumnSpec, NumericOrder, SqlType};

use crate::error::SchemaResult;
use std::path::Path;

/// Parse a CREATE TABLE SQL file into column generation specs.
pub fn specs_from_sql(path: &Path) -> SchemaResult<Vec<ColumnSpec>> {
    let table = ddl::table_info_from_file(path)?;
    build_specs(&table)
}
