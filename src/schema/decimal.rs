//! Decimal shapes and encodings
//!
//! DECIMAL(p, s) maps onto the narrowest Parquet physical type that can hold
//! p digits: INT32 up to 9, INT64 up to 18, and FIXED_LEN_BYTE_ARRAY beyond
//! that. Fixed-len values are big-endian two's complement, sign-extended to
//! the deduced width.
//!
//! Unscaled values above the i64 range are handled as raw byte arrays; the
//! only arithmetic needed is multiply-by-ten-and-add, done in place.

use parquet::basic::Type as PhysicalType;
use rand::rngs::StdRng;
use rand::Rng;

/// Deduce the physical type and fixed byte length for a decimal precision.
///
/// Returns a byte length of 0 for the integer-backed shapes.
pub fn deduce_decimal_type(precision: i32) -> (PhysicalType, u32) {
    if precision <= 9 {
        return (PhysicalType::INT32, 0);
    }
    if precision <= 18 {
        return (PhysicalType::INT64, 0);
    }

    let bits = pow10_minus_one_bit_len(precision as u32) + 1;
    let byte_len = bits.div_ceil(8);
    (PhysicalType::FIXED_LEN_BYTE_ARRAY, byte_len)
}

/// Bit length of 10^p - 1.
fn pow10_minus_one_bit_len(p: u32) -> u32 {
    let mut bytes = pow10_bytes(p);
    // Subtract one, borrowing from the least significant end.
    for b in bytes.iter_mut().rev() {
        if *b > 0 {
            *b -= 1;
            break;
        }
        *b = 0xFF;
    }
    bit_len(&bytes)
}

/// Big-endian bytes of 10^p.
fn pow10_bytes(p: u32) -> Vec<u8> {
    let mut bytes = vec![1u8];
    for _ in 0..p {
        mul_add_in_place(&mut bytes, 10, 0);
    }
    bytes
}

/// In-place `value = value * factor + addend` on a big-endian byte array,
/// growing at the front on carry.
fn mul_add_in_place(bytes: &mut Vec<u8>, factor: u32, addend: u32) {
    let mut carry = addend;
    for b in bytes.iter_mut().rev() {
        let v = (*b as u32) * factor + carry;
        *b = (v & 0xFF) as u8;
        carry = v >> 8;
    }
    while carry > 0 {
        bytes.insert(0, (carry & 0xFF) as u8);
        carry >>= 8;
    }
}

fn bit_len(bytes: &[u8]) -> u32 {
    for (i, b) in bytes.iter().enumerate() {
        if *b != 0 {
            return (bytes.len() - i) as u32 * 8 - b.leading_zeros();
        }
    }
    0
}

/// Encode an i64 unscaled value as big-endian two's complement of the given
/// width, sign-extending (or truncating low bytes when narrower than 8).
pub fn fixed_len_from_i64(unscaled: i64, byte_len: usize) -> Vec<u8> {
    let full = unscaled.to_be_bytes();
    if byte_len <= full.len() {
        return full[full.len() - byte_len..].to_vec();
    }
    let fill = if unscaled < 0 { 0xFF } else { 0x00 };
    let mut out = vec![fill; byte_len];
    out[byte_len - full.len()..].copy_from_slice(&full);
    out
}

/// Uniformly random unscaled value in `[0, 10^precision)`, big-endian,
/// padded to the given width.
///
/// Built digit by digit so widths beyond 64 bits need no bignum support.
pub fn random_unscaled_bytes(precision: u32, byte_len: usize, rng: &mut StdRng) -> Vec<u8> {
    let mut value = vec![0u8];
    for _ in 0..precision {
        let digit = rng.gen_range(0..10u32);
        mul_add_in_place(&mut value, 10, digit);
    }

    if value.len() > byte_len {
        // Cannot happen when byte_len came from deduce_decimal_type
        return value[value.len() - byte_len..].to_vec();
    }
    let mut out = vec![0u8; byte_len];
    out[byte_len - value.len()..].copy_from_slice(&value);
    out
}
