//! Compact ("nBits") target encoding.
//!
//! The high byte is a base-256 exponent, the low 23 bits a mantissa and bit
//! 23 a sign bit that is never set on a valid target.

use primitive_types::U256;

use crate::WorkError;

const SIGN_BIT: u32 = 0x0080_0000;
const MANTISSA_MASK: u32 = 0x007f_ffff;

/// Expand a compact target. Negative, zero and overflowing encodings are errors.
pub fn compact_to_target(bits: u32) -> Result<U256, WorkError> {
    let exponent = bits >> 24;
    let mantissa = bits & MANTISSA_MASK;

    if bits & SIGN_BIT != 0 && mantissa != 0 {
        return Err(WorkError::InvalidCompactTarget(bits));
    }
    let overflows = mantissa != 0
        && (exponent > 34
            || (mantissa > 0xff && exponent > 33)
            || (mantissa > 0xffff && exponent > 32));
    if overflows {
        return Err(WorkError::InvalidCompactTarget(bits));
    }

    let target = if exponent <= 3 {
        U256::from(mantissa >> (8 * (3 - exponent)))
    } else {
        U256::from(mantissa) << (8 * (exponent - 3) as usize)
    };
    if target.is_zero() {
        return Err(WorkError::InvalidCompactTarget(bits));
    }
    Ok(target)
}

/// Canonical compact encoding of a target. Precision below the mantissa is lost.
pub fn target_to_compact(target: U256) -> u32 {
    let mut size = (target.bits() as u32 + 7) / 8;
    let mut compact = if size <= 3 {
        (target.low_u64() << (8 * (3 - size))) as u32
    } else {
        (target >> (8 * (size - 3) as usize)).low_u64() as u32
    };
    if compact & SIGN_BIT != 0 {
        compact >>= 8;
        size += 1;
    }
    compact | (size << 24)
}
