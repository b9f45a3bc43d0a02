//! Per-column generation specs
//!
//! A [`ColumnSpec`] captures everything value production needs to know about
//! one column: SQL type tag, Parquet physical/converted types, lengths,
//! null rate, value sets, ordering, Gaussian parameters, and the
//! compressibility hint. Specs are built once from a parsed [`TableInfo`]
//! and shared read-only across all worker threads.

use crate::error::{SchemaError, SchemaResult};
use crate::schema::ddl::TableInfo;
use crate::schema::decimal::deduce_decimal_type;
use parquet::basic::{ConvertedType, Type as PhysicalType};

/// Characters used for random string generation.
pub const VALID_CHARS: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_&*!.;<>?:-+()[]{}";

/// Ordering of numeric data in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericOrder {
    /// Values equal the row index
    Total,
    /// Mostly the row index with occasional jumps
    Partial,
    /// Deterministic scramble of the row index
    Random,
}

/// SQL type tags supported by the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlType {
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Float,
    Double,
    Decimal,
    Char,
    Varchar,
    Binary,
    Varbinary,
    Blob,
    TinyBlob,
    MediumBlob,
    LongBlob,
    Text,
    TinyText,
    MediumText,
    LongText,
    Date,
    Timestamp,
    Datetime,
    Time,
    Year,
    Json,
}

impl SqlType {
    /// Map a lowercased DDL type name to a tag.
    pub fn from_name(name: &str) -> Option<Self> {
        let t = match name {
            "tinyint" => SqlType::TinyInt,
            "smallint" => SqlType::SmallInt,
            "mediumint" => SqlType::MediumInt,
            "int" | "integer" => SqlType::Int,
            "bigint" => SqlType::BigInt,
            "float" => SqlType::Float,
            "double" | "real" => SqlType::Double,
            "decimal" | "numeric" => SqlType::Decimal,
            "char" => SqlType::Char,
            "varchar" => SqlType::Varchar,
            "binary" => SqlType::Binary,
            "varbinary" => SqlType::Varbinary,
            "blob" => SqlType::Blob,
            "tinyblob" => SqlType::TinyBlob,
            "mediumblob" => SqlType::MediumBlob,
            "longblob" => SqlType::LongBlob,
            "text" => SqlType::Text,
            "tinytext" => SqlType::TinyText,
            "mediumtext" => SqlType::MediumText,
            "longtext" => SqlType::LongText,
            "date" => SqlType::Date,
            "timestamp" => SqlType::Timestamp,
            "datetime" => SqlType::Datetime,
            "time" => SqlType::Time,
            "year" => SqlType::Year,
            "json" => SqlType::Json,
            _ => return None,
        };
        Some(t)
    }

    /// Display name of the tag.
    pub fn name(&self) -> &'static str {
        match self {
            SqlType::TinyInt => "tinyint",
            SqlType::SmallInt => "smallint",
            SqlType::MediumInt => "mediumint",
            SqlType::Int => "int",
            SqlType::BigInt => "bigint",
            SqlType::Float => "float",
            SqlType::Double => "double",
            SqlType::Decimal => "decimal",
            SqlType::Char => "char",
            SqlType::Varchar => "varchar",
            SqlType::Binary => "binary",
            SqlType::Varbinary => "varbinary",
            SqlType::Blob => "blob",
            SqlType::TinyBlob => "tinyblob",
            SqlType::MediumBlob => "mediumblob",
            SqlType::LongBlob => "longblob",
            SqlType::Text => "text",
            SqlType::TinyText => "tinytext",
            SqlType::MediumText => "mediumtext",
            SqlType::LongText => "longtext",
            SqlType::Date => "date",
            SqlType::Timestamp => "timestamp",
            SqlType::Datetime => "datetime",
            SqlType::Time => "time",
            SqlType::Year => "year",
            SqlType::Json => "json",
        }
    }

    /// Integer families that share the integer generation path.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            SqlType::TinyInt
                | SqlType::SmallInt
                | SqlType::MediumInt
                | SqlType::Int
                | SqlType::BigInt
        )
    }

    /// Numeric types never take their declared display width as a byte
    /// length.
    pub fn is_numeric(&self) -> bool {
        self.is_integer()
            || matches!(
                self,
                SqlType::Float | SqlType::Double | SqlType::Decimal | SqlType::Year
            )
    }

    /// String-like types sharing the BYTE_ARRAY generation path.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            SqlType::Char
                | SqlType::Varchar
                | SqlType::Binary
                | SqlType::Varbinary
                | SqlType::Blob
                | SqlType::TinyBlob
                | SqlType::MediumBlob
                | SqlType::LongBlob
                | SqlType::Text
                | SqlType::TinyText
                | SqlType::MediumText
                | SqlType::LongText
        )
    }
}

/// Immutable description of one column after DDL parsing and
/// comment-option resolution.
#[derive(Debug, Clone)]
pub struct ColumnSpec {
    /// Column name
    pub name: String,
    /// SQL type tag
    pub sql_type: SqlType,
    /// Parquet physical type
    pub physical: PhysicalType,
    /// Parquet logical annotation
    pub converted: ConvertedType,

    /// Bit width for numerics; max byte length for strings/binaries
    pub type_len: u32,
    /// String length lower bound
    pub min_len: u32,
    /// Decimal precision
    pub precision: i32,
    /// Decimal scale
    pub scale: i32,

    /// Percent of rows that are NULL (0-100)
    pub null_percent: u32,
    /// Explicit string values to draw from
    pub value_set: Vec<String>,
    /// Explicit integer values to draw from
    pub int_set: Vec<i64>,
    /// Covered by a primary/unique key
    pub is_unique: bool,
    /// Numeric ordering
    pub order: NumericOrder,
    /// Gaussian mean
    pub mean: i64,
    /// Gaussian stddev; >0 enables the Gaussian path
    pub stddev: i64,
    /// Integer signedness
    pub signed: bool,
    /// Percent of non-duplicate bytes in generated strings (1-100)
    pub compress: u32,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            name: String::new(),
            sql_type: SqlType::Int,
            physical: PhysicalType::INT32,
            converted: ConvertedType::NONE,
            type_len: 0,
            min_len: 0,
            precision: 0,
            scale: 0,
            null_percent: 0,
            value_set: Vec::new(),
            int_set: Vec::new(),
            is_unique: false,
            order: NumericOrder::Random,
            mean: 0,
            stddev: 0,
            signed: false,
            compress: 100,
        }
    }
}

/// Default template for a type tag.
fn default_spec(sql_type: SqlType) -> ColumnSpec {
    let mut spec = ColumnSpec {
        sql_type,
        ..Default::default()
    };
    match sql_type {
        SqlType::TinyInt => {
            spec.physical = PhysicalType::INT32;
            spec.converted = ConvertedType::INT_8;
            spec.type_len = 8;
            spec.signed = true;
        }
        SqlType::SmallInt => {
            spec.physical = PhysicalType::INT32;
            spec.converted = ConvertedType::INT_16;
            spec.type_len = 16;
            spec.signed = true;
        }
        SqlType::MediumInt => {
            spec.physical = PhysicalType::INT32;
            spec.converted = ConvertedType::INT_32;
            spec.type_len = 24;
            spec.signed = true;
        }
        SqlType::Int => {
            spec.physical = PhysicalType::INT32;
            spec.converted = ConvertedType::INT_32;
            spec.type_len = 32;
            spec.signed = true;
        }
        SqlType::BigInt => {
            spec.physical = PhysicalType::INT64;
            spec.converted = ConvertedType::NONE;
            spec.type_len = 64;
            spec.signed = true;
        }
        SqlType::Float => {
            spec.physical = PhysicalType::FLOAT;
            spec.converted = ConvertedType::NONE;
            spec.type_len = 32;
        }
        SqlType::Double => {
            spec.physical = PhysicalType::DOUBLE;
            spec.converted = ConvertedType::NONE;
            spec.type_len = 32;
        }
        SqlType::Decimal => {
            spec.physical = PhysicalType::INT64;
            spec.converted = ConvertedType::DECIMAL;
        }
        SqlType::Date => {
            spec.physical = PhysicalType::INT32;
            spec.converted = ConvertedType::DATE;
        }
        SqlType::Timestamp | SqlType::Datetime => {
            spec.physical = PhysicalType::INT64;
            spec.converted = ConvertedType::TIMESTAMP_MICROS;
        }
        SqlType::Time => {
            spec.physical = PhysicalType::INT64;
            spec.converted = ConvertedType::INT_64;
            spec.type_len = 8;
            spec.signed = true;
        }
        SqlType::Year => {
            spec.physical = PhysicalType::INT32;
            spec.converted = ConvertedType::INT_32;
            spec.type_len = 8;
            spec.signed = true;
        }
        SqlType::Json => {
            spec.physical = PhysicalType::BYTE_ARRAY;
            spec.converted = ConvertedType::NONE;
            spec.type_len = 64;
        }
        _ => {
            // All char/binary/blob/text variants
            spec.physical = PhysicalType::BYTE_ARRAY;
            spec.converted = ConvertedType::NONE;
            spec.type_len = 64;
        }
    }
    spec
}

/// Split a comment into options on top-level commas.
///
/// Tracks bracket depth and double-quote state so `set=[...]` payloads can
/// carry commas and quoted strings. Unbalanced state is an error.
fn split_comment_opts(comment: &str) -> Result<Vec<String>, ()> {
    let mut opts = Vec::new();
    let mut start = 0usize;
    let mut bracket_depth = 0i32;
    let mut in_quotes = false;
    let bytes = comment.as_bytes();

    for i in 0..bytes.len() {
        match bytes[i] {
            b'"' => in_quotes = !in_quotes,
            b'[' if !in_quotes => bracket_depth += 1,
            b']' if !in_quotes => {
                bracket_depth -= 1;
                if bracket_depth < 0 {
                    return Err(());
                }
            }
            b',' if !in_quotes && bracket_depth == 0 => {
                let opt = &comment[start..i];
                if !opt.is_empty() {
                    opts.push(opt.to_string());
                }
                start = i + 1;
            }
            _ => {}
        }
    }

    if in_quotes || bracket_depth != 0 {
        return Err(());
    }

    if start < comment.len() {
        let opt = &comment[start..];
        if !opt.is_empty() {
            opts.push(opt.to_string());
        }
    }

    Ok(opts)
}

impl ColumnSpec {
    /// Parse the column comment and apply recognized `key=value` options.
    fn parse_comment(&mut self, comment: &str) -> SchemaResult<()> {
        self.order = NumericOrder::Random;
        let comment: String = comment.chars().filter(|c| *c != ' ').collect();
        if comment.is_empty() {
            return Ok(());
        }

        let opts = split_comment_opts(&comment).map_err(|_| SchemaError::MalformedComment {
            column: self.name.clone(),
            comment: comment.clone(),
        })?;

        for opt in opts {
            let Some((key, value)) = opt.split_once('=') else {
                return Err(SchemaError::MalformedComment {
                    column: self.name.clone(),
                    comment: opt,
                });
            };
            match key {
                "null_percent" => self.null_percent = value.parse().unwrap_or(0),
                "max_length" => self.type_len = value.parse().unwrap_or(0),
                "min_length" => self.min_len = value.parse().unwrap_or(0),
                "mean" => self.mean = value.parse().unwrap_or(0),
                "stddev" => self.stddev = value.parse().unwrap_or(0),
                "compress" => {
                    let compress: i64 =
                        value.parse().map_err(|_| SchemaError::InvalidOption {
                            column: self.name.clone(),
                            key: "compress",
                            value: value.to_string(),
                        })?;
                    self.compress = compress.clamp(1, 100) as u32;
                }
                "set" => {
                    if let Ok(strings) = serde_json::from_str::<Vec<String>>(value) {
                        self.value_set = strings;
                        continue;
                    }
                    if let Ok(ints) = serde_json::from_str::<Vec<i64>>(value) {
                        self.int_set = ints;
                        continue;
                    }
                    return Err(SchemaError::InvalidOption {
                        column: self.name.clone(),
                        key: "set",
                        value: value.to_string(),
                    });
                }
                "order" => {
                    self.order = match value {
                        "total_order" => NumericOrder::Total,
                        "partial_order" => NumericOrder::Partial,
                        "random_order" => NumericOrder::Random,
                        _ => {
                            return Err(SchemaError::InvalidOption {
                                column: self.name.clone(),
                                key: "order",
                                value: value.to_string(),
                            })
                        }
                    };
                }
                _ => {
                    // Unrecognized keys are ignored
                }
            }
        }
        Ok(())
    }
}

/// Build column specs from a parsed table, in declaration order.
pub fn build_specs(table: &TableInfo) -> SchemaResult<Vec<ColumnSpec>> {
    let mut specs = Vec::with_capacity(table.columns.len());

    for col in &table.columns {
        let sql_type =
            SqlType::from_name(&col.type_name).ok_or_else(|| SchemaError::UnsupportedType {
                column: col.name.clone(),
                sql_type: col.type_name.clone(),
            })?;

        let mut spec = default_spec(sql_type);
        spec.name = col.name.to_lowercase();
        spec.order = NumericOrder::Random;
        spec.compress = 100;

        if !sql_type.is_numeric() {
            if let Some(flen) = col.flen {
                if flen > 0 {
                    spec.type_len = flen.min(64);
                }
            }
        }

        if sql_type == SqlType::Decimal {
            spec.precision = col.flen.unwrap_or(10) as i32;
            spec.scale = col.decimal_digits.unwrap_or(0);
            if spec.precision == 0 {
                return Err(SchemaError::InvalidDecimal {
                    column: col.name.clone(),
                    reason: "precision must be greater than 0".to_string(),
                });
            }
            if spec.scale < 0 || spec.scale > spec.precision {
                return Err(SchemaError::InvalidDecimal {
                    column: col.name.clone(),
                    reason: format!(
                        "scale {} out of range for precision {}",
                        spec.scale, spec.precision
                    ),
                });
            }
            let (physical, byte_len) = deduce_decimal_type(spec.precision);
            spec.physical = physical;
            spec.type_len = byte_len;
        }

        if !col.comment.is_empty() {
            spec.parse_comment(&col.comment)?;
        }

        if spec.min_len == 0 {
            spec.min_len = (spec.type_len as f64 * 0.75) as u32;
        }
        spec.min_len = spec.min_len.min(spec.type_len);

        specs.push(spec);
    }

    // Columns covered by a primary or unique key never repeat values.
    for (i, col) in table.columns.iter().enumerate() {
        if col.primary_key || col.unique {
            specs[i].is_unique = true;
        }
    }
    for index in &table.indexes {
        if !(index.primary || index.unique) {
            continue;
        }
        for key_col in &index.columns {
            if let Some(spec) = specs
                .iter_mut()
                .find(|s| s.name.eq_ignore_ascii_case(key_col))
            {
                spec.is_unique = true;
            }
        }
    }

    Ok(specs)
}
