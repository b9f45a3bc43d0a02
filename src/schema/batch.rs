//! Parquet batch fillers
//!
//! Each filler produces one batch for a column: a definition-level array
//! (0 = null, 1 = present) covering every row, plus a dense value buffer
//! holding only the present rows, which is the layout the column chunk
//! writers consume.

use crate::error::{Result, TableGenError};
use crate::schema::datagen::{fill_compressible, TIMESTAMP_RANGE_MICROS};
use crate::schema::decimal::{fixed_len_from_i64, random_unscaled_bytes};
use crate::schema::spec::{ColumnSpec, SqlType};
use parquet::basic::Type as PhysicalType;
use parquet::data_type::{ByteArray, FixedLenByteArray};
use parquet::errors::ParquetError;
use rand::rngs::StdRng;
use rand::{Rng, RngCore};
use uuid::Uuid;

/// Typed value buffer for one column batch.
#[derive(Debug)]
pub enum BatchValues {
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Float(Vec<f32>),
    Double(Vec<f64>),
    Bytes(Vec<ByteArray>),
    FixedBytes(Vec<FixedLenByteArray>),
}

impl BatchValues {
    /// Allocate the buffer matching a physical type.
    pub fn for_physical(physical: PhysicalType, capacity: usize) -> Result<Self> {
        let values = match physical {
            PhysicalType::INT32 => BatchValues::Int32(Vec::with_capacity(capacity)),
            PhysicalType::INT64 => BatchValues::Int64(Vec::with_capacity(capacity)),
            PhysicalType::FLOAT => BatchValues::Float(Vec::with_capacity(capacity)),
            PhysicalType::DOUBLE => BatchValues::Double(Vec::with_capacity(capacity)),
            PhysicalType::BYTE_ARRAY => BatchValues::Bytes(Vec::with_capacity(capacity)),
            PhysicalType::FIXED_LEN_BYTE_ARRAY => {
                BatchValues::FixedBytes(Vec::with_capacity(capacity))
            }
            other => {
                return Err(TableGenError::Parquet(ParquetError::General(format!(
                    "unsupported physical type: {other}"
                ))))
            }
        };
        Ok(values)
    }

    fn clear(&mut self) {
        match self {
            BatchValues::Int32(v) => v.clear(),
            BatchValues::Int64(v) => v.clear(),
            BatchValues::Float(v) => v.clear(),
            BatchValues::Double(v) => v.clear(),
            BatchValues::Bytes(v) => v.clear(),
            BatchValues::FixedBytes(v) => v.clear(),
        }
    }
}

/// Batched null decisions: one random byte per row.
pub fn batch_nulls(null_percent: u32, len: usize, rng: &mut StdRng) -> Vec<bool> {
    let mut bytes = vec![0u8; len];
    rng.fill_bytes(&mut bytes);
    bytes
        .into_iter()
        .map(|b| (b as u32) * 100 < null_percent * 256)
        .collect()
}

fn buffer_mismatch(spec: &ColumnSpec) -> TableGenError {
    TableGenError::Parquet(ParquetError::General(format!(
        "unexpected buffer type for column '{}' ({})",
        spec.name,
        spec.sql_type.name()
    )))
}

impl ColumnSpec {
    /// Fill one batch of values and definition levels for this column.
    ///
    /// `row_id` is the global ordinal of the first row in the batch.
    pub fn fill_batch(
        &self,
        row_id: u64,
        batch: usize,
        values: &mut BatchValues,
        def_levels: &mut Vec<i16>,
        rng: &mut StdRng,
    ) -> Result<()> {
        values.clear();
        def_levels.clear();

        match self.sql_type {
            SqlType::Decimal => self.fill_decimal_batch(batch, values, def_levels, rng),
            SqlType::BigInt => match values {
                BatchValues::Int64(out) => {
                    self.fill_int_batch(row_id, batch, def_levels, rng, |v| out.push(v));
                    Ok(())
                }
                _ => Err(buffer_mismatch(self)),
            },
            SqlType::Int | SqlType::MediumInt | SqlType::SmallInt | SqlType::TinyInt => {
                match values {
                    BatchValues::Int32(out) => {
                        self.fill_int_batch(row_id, batch, def_levels, rng, |v| {
                            out.push(v as i32)
                        });
                        Ok(())
                    }
                    _ => Err(buffer_mismatch(self)),
                }
            }
            SqlType::Float => match values {
                BatchValues::Float(out) => {
                    let nulls = batch_nulls(self.null_percent, batch, rng);
                    for null in nulls {
                        if null {
                            def_levels.push(0);
                        } else {
                            def_levels.push(1);
                            out.push(self.generate_int(row_id, rng) as f32 + 0.1);
                        }
                    }
                    Ok(())
                }
                _ => Err(buffer_mismatch(self)),
            },
            SqlType::Double => match values {
                BatchValues::Double(out) => {
                    let nulls = batch_nulls(self.null_percent, batch, rng);
                    for null in nulls {
                        if null {
                            def_levels.push(0);
                        } else {
                            def_levels.push(1);
                            out.push(self.generate_int(row_id, rng) as f64 + 0.1);
                        }
                    }
                    Ok(())
                }
                _ => Err(buffer_mismatch(self)),
            },
            SqlType::Json => match values {
                BatchValues::Bytes(out) => {
                    let nulls = batch_nulls(self.null_percent, batch, rng);
                    for null in nulls {
                        if null {
                            def_levels.push(0);
                        } else {
                            def_levels.push(1);
                            out.push(ByteArray::from("[1,2,3,4,5]".as_bytes().to_vec()));
                        }
                    }
                    Ok(())
                }
                _ => Err(buffer_mismatch(self)),
            },
            SqlType::Date => match values {
                BatchValues::Int32(out) => {
                    let nulls = batch_nulls(self.null_percent, batch, rng);
                    for null in nulls {
                        if null {
                            def_levels.push(0);
                        } else {
                            def_levels.push(1);
                            out.push((rng.next_u32() & 16383) as i32);
                        }
                    }
                    Ok(())
                }
                _ => Err(buffer_mismatch(self)),
            },
            SqlType::Timestamp | SqlType::Datetime | SqlType::Time => match values {
                BatchValues::Int64(out) => {
                    let nulls = batch_nulls(self.null_percent, batch, rng);
                    for null in nulls {
                        if null {
                            def_levels.push(0);
                        } else {
                            def_levels.push(1);
                            out.push(rng.gen_range(0..TIMESTAMP_RANGE_MICROS));
                        }
                    }
                    Ok(())
                }
                _ => Err(buffer_mismatch(self)),
            },
            SqlType::Year => match values {
                BatchValues::Int32(out) => {
                    let nulls = batch_nulls(self.null_percent, batch, rng);
                    for null in nulls {
                        if null {
                            def_levels.push(0);
                        } else {
                            def_levels.push(1);
                            out.push(rng.gen_range(2000..2050));
                        }
                    }
                    Ok(())
                }
                _ => Err(buffer_mismatch(self)),
            },
            _ => match values {
                BatchValues::Bytes(out) => {
                    self.fill_string_batch(batch, out, def_levels, rng);
                    Ok(())
                }
                _ => Err(buffer_mismatch(self)),
            },
        }
    }

    fn fill_int_batch(
        &self,
        row_id: u64,
        batch: usize,
        def_levels: &mut Vec<i16>,
        rng: &mut StdRng,
        mut push: impl FnMut(i64),
    ) {
        let nulls = batch_nulls(self.null_percent, batch, rng);
        for (i, null) in nulls.into_iter().enumerate() {
            if null {
                def_levels.push(0);
            } else {
                def_levels.push(1);
                push(self.generate_int(row_id + i as u64, rng));
            }
        }
    }

    fn fill_string_batch(
        &self,
        batch: usize,
        out: &mut Vec<ByteArray>,
        def_levels: &mut Vec<i16>,
        rng: &mut StdRng,
    ) {
        let nulls = batch_nulls(self.null_percent, batch, rng);

        if self.is_unique {
            for null in nulls {
                if null {
                    def_levels.push(0);
                } else {
                    def_levels.push(1);
                    let uuid = Uuid::new_v4().to_string();
                    out.push(ByteArray::from(uuid.into_bytes()));
                }
            }
            return;
        }

        if !self.value_set.is_empty() {
            for null in nulls {
                if null {
                    def_levels.push(0);
                } else {
                    def_levels.push(1);
                    let choice = &self.value_set[rng.gen_range(0..self.value_set.len())];
                    out.push(ByteArray::from(choice.as_bytes().to_vec()));
                }
            }
            return;
        }

        // One length per batch keeps the fills contiguous and cheap
        let lower = self.min_len as usize;
        let upper = self.type_len as usize;
        let slen = rng.gen_range(lower..=upper);

        for null in nulls {
            if null {
                def_levels.push(0);
            } else {
                def_levels.push(1);
                let mut buf = vec![0u8; slen];
                fill_compressible(&mut buf, self.compress, rng);
                out.push(ByteArray::from(buf));
            }
        }
    }

    fn fill_decimal_batch(
        &self,
        batch: usize,
        values: &mut BatchValues,
        def_levels: &mut Vec<i16>,
        rng: &mut StdRng,
    ) -> Result<()> {
        let nulls = batch_nulls(self.null_percent, batch, rng);

        match values {
            BatchValues::Int32(out) => {
                for null in nulls {
                    if null {
                        def_levels.push(0);
                    } else {
                        def_levels.push(1);
                        out.push(self.random_unscaled_i64(rng) as i32);
                    }
                }
                Ok(())
            }
            BatchValues::Int64(out) => {
                for null in nulls {
                    if null {
                        def_levels.push(0);
                    } else {
                        def_levels.push(1);
                        out.push(self.random_unscaled_i64(rng));
                    }
                }
                Ok(())
            }
            BatchValues::FixedBytes(out) => {
                let byte_len = self.type_len as usize;
                for null in nulls {
                    if null {
                        def_levels.push(0);
                    } else {
                        def_levels.push(1);
                        let bytes = if self.int_set.is_empty() {
                            random_unscaled_bytes(self.precision as u32, byte_len, rng)
                        } else {
                            let v = self.int_set[rng.gen_range(0..self.int_set.len())];
                            fixed_len_from_i64(v, byte_len)
                        };
                        out.push(FixedLenByteArray::from(ByteArray::from(bytes)));
                    }
                }
                Ok(())
            }
            _ => Err(buffer_mismatch(self)),
        }
    }

    /// Unscaled decimal for the integer-backed shapes, uniform in
    /// `[0, 10^precision)` or drawn from the explicit set.
    fn random_unscaled_i64(&self, rng: &mut StdRng) -> i64 {
        if !self.int_set.is_empty() {
            return self.int_set[rng.gen_range(0..self.int_set.len())];
        }
        let limit = 10i64.pow(self.precision as u32);
        rng.gen_range(0..limit)
    }
}
