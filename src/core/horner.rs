//! core::horner
//!
//! Horner encoding between argument tuples and flat table offsets.
//!
//! # Layout
//!
//! An argument tuple `(a_0, ..., a_{k-1})` over a base `b` maps to
//!
//! ```text
//! a_0 * b^(k-1) + a_1 * b^(k-2) + ... + a_{k-1}
//! ```
//!
//! so the first argument is the most significant digit. The mixed-radix
//! variants replace the scalar base with one size per position.
//!
//! # Invariants
//!
//! - `decode(encode(a, b), a.len(), b) == a` for every valid tuple
//! - Distinct valid tuples of a fixed arity never share an offset
//! - Overflow is reported, never wrapped
//!
//! # Example
//!
//! ```
//! use conlat::core::horner;
//!
//! assert_eq!(horner::encode(&[1, 2, 3], 5).unwrap(), 38);
//! assert_eq!(horner::decode(38, 3, 5).unwrap(), vec![1, 2, 3]);
//! assert_eq!(horner::table_size(3, 5).unwrap(), 125);
//! ```

use thiserror::Error;

use super::error::ErrorKind;

/// Errors from Horner encoding and decoding.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HornerError {
    #[error("invalid base {0}: base must be positive")]
    InvalidBase(usize),

    #[error("digit {digit} at position {position} is not below its base {base}")]
    DigitOutOfRange {
        position: usize,
        digit: usize,
        base: usize,
    },

    #[error("argument count {args} does not match radix count {sizes}")]
    LengthMismatch { args: usize, sizes: usize },

    #[error("index {index} is outside a table of size {size}")]
    IndexOutOfRange { index: usize, size: usize },

    #[error("table size overflows usize")]
    Overflow,
}

impl HornerError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            HornerError::Overflow => ErrorKind::ResourceLimit,
            _ => ErrorKind::Validation,
        }
    }
}

/// Encode `args` as a single offset in base `base`.
///
/// # Errors
///
/// Fails if `base` is zero, any digit is `>= base`, or the offset
/// does not fit in `usize`.
pub fn encode(args: &[usize], base: usize) -> Result<usize, HornerError> {
    if base == 0 {
        return Err(HornerError::InvalidBase(base));
    }
    args.iter().enumerate().try_fold(0usize, |acc, (position, &digit)| {
        if digit >= base {
            return Err(HornerError::DigitOutOfRange {
                position,
                digit,
                base,
            });
        }
        acc.checked_mul(base)
            .and_then(|v| v.checked_add(digit))
            .ok_or(HornerError::Overflow)
    })
}

/// Decode `index` into an `arity`-length tuple in base `base`.
///
/// # Errors
///
/// Fails if `base` is zero, `base^arity` overflows, or `index` is not
/// below `base^arity` (for arity 0 only index 0 is valid).
pub fn decode(index: usize, arity: usize, base: usize) -> Result<Vec<usize>, HornerError> {
    if base == 0 {
        return Err(HornerError::InvalidBase(base));
    }
    let size = table_size(arity, base)?;
    if index >= size {
        return Err(HornerError::IndexOutOfRange { index, size });
    }

    let mut digits = vec![0; arity];
    let mut rest = index;
    for slot in digits.iter_mut().rev() {
        *slot = rest % base;
        rest /= base;
    }
    Ok(digits)
}

/// Number of entries in a table of the given arity over `base` values.
///
/// # Errors
///
/// Fails with [`HornerError::Overflow`] instead of wrapping.
pub fn table_size(arity: usize, base: usize) -> Result<usize, HornerError> {
    if base == 0 {
        return Err(HornerError::InvalidBase(base));
    }
    let exp = u32::try_from(arity).map_err(|_| HornerError::Overflow)?;
    base.checked_pow(exp).ok_or(HornerError::Overflow)
}

/// Encode `args` with one radix per position.
///
/// An empty tuple over empty sizes encodes to 0.
pub fn encode_mixed(args: &[usize], sizes: &[usize]) -> Result<usize, HornerError> {
    if args.len() != sizes.len() {
        return Err(HornerError::LengthMismatch {
            args: args.len(),
            sizes: sizes.len(),
        });
    }
    let mut acc = 0usize;
    for (position, (&digit, &base)) in args.iter().zip(sizes).enumerate() {
        if base == 0 {
            return Err(HornerError::InvalidBase(base));
        }
        if digit >= base {
            return Err(HornerError::DigitOutOfRange {
                position,
                digit,
                base,
            });
        }
        acc = acc
            .checked_mul(base)
            .and_then(|v| v.checked_add(digit))
            .ok_or(HornerError::Overflow)?;
    }
    Ok(acc)
}

/// Decode `index` into a tuple with one radix per position.
pub fn decode_mixed(index: usize, sizes: &[usize]) -> Result<Vec<usize>, HornerError> {
    let size = table_size_mixed(sizes)?;
    if index >= size {
        return Err(HornerError::IndexOutOfRange { index, size });
    }

    let mut digits = vec![0; sizes.len()];
    let mut rest = index;
    for (slot, &base) in digits.iter_mut().zip(sizes).rev() {
        *slot = rest % base;
        rest /= base;
    }
    Ok(digits)
}

/// Product of the per-position sizes.
pub fn table_size_mixed(sizes: &[usize]) -> Result<usize, HornerError> {
    sizes.iter().try_fold(1usize, |acc, &base| {
        if base == 0 {
            return Err(HornerError::InvalidBase(base));
        }
        acc.checked_mul(base).ok_or(HornerError::Overflow)
    })
}

/// Positional weights: `weights[i]` is the offset step of position `i`.
///
/// For sizes `[s_0, ..., s_{k-1}]` the last weight is 1 and
/// `weights[i] = weights[i + 1] * s_{i+1}`.
pub fn weights(sizes: &[usize]) -> Result<Vec<usize>, HornerError> {
    let mut weights = vec![1usize; sizes.len()];
    for i in (0..sizes.len().saturating_sub(1)).rev() {
        weights[i] = weights[i + 1]
            .checked_mul(sizes[i + 1])
            .ok_or(HornerError::Overflow)?;
    }
    Ok(weights)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_known_value() {
        assert_eq!(encode(&[1, 2, 3], 5).unwrap(), 38);
        assert_eq!(decode(38, 3, 5).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn encode_empty_is_zero() {
        assert_eq!(encode(&[], 7).unwrap(), 0);
        assert_eq!(decode(0, 0, 7).unwrap(), Vec::<usize>::new());
    }

    #[test]
    fn decode_arity_zero_rejects_nonzero_index() {
        assert_eq!(
            decode(1, 0, 3),
            Err(HornerError::IndexOutOfRange { index: 1, size: 1 })
        );
    }

    #[test]
    fn encode_rejects_large_digit() {
        assert_eq!(
            encode(&[0, 5], 5),
            Err(HornerError::DigitOutOfRange {
                position: 1,
                digit: 5,
                base: 5
            })
        );
    }

    #[test]
    fn zero_base_rejected() {
        assert_eq!(encode(&[], 0), Err(HornerError::InvalidBase(0)));
        assert_eq!(table_size(2, 0), Err(HornerError::InvalidBase(0)));
        assert!(decode(0, 1, 0).is_err());
    }

    #[test]
    fn table_size_overflow_detected() {
        assert_eq!(table_size(3, 4).unwrap(), 64);
        assert_eq!(table_size(0, 9).unwrap(), 1);
        assert_eq!(table_size(200, 2), Err(HornerError::Overflow));
        assert_eq!(HornerError::Overflow.kind(), ErrorKind::ResourceLimit);
    }

    #[test]
    fn encode_overflow_detected() {
        let args = vec![1usize; 70];
        assert_eq!(encode(&args, 2), Err(HornerError::Overflow));
    }

    #[test]
    fn decode_out_of_range() {
        assert!(decode(125, 3, 5).is_err());
        assert!(decode(124, 3, 5).is_ok());
    }

    #[test]
    fn mixed_radix_roundtrip() {
        let sizes = [2, 3, 4];
        assert_eq!(table_size_mixed(&sizes).unwrap(), 24);
        for index in 0..24 {
            let digits = decode_mixed(index, &sizes).unwrap();
            assert_eq!(encode_mixed(&digits, &sizes).unwrap(), index);
        }
        assert_eq!(encode_mixed(&[1, 2, 3], &sizes).unwrap(), 12 + 8 + 3);
    }

    #[test]
    fn mixed_radix_length_mismatch() {
        assert_eq!(
            encode_mixed(&[1], &[2, 2]),
            Err(HornerError::LengthMismatch { args: 1, sizes: 2 })
        );
        assert_eq!(encode_mixed(&[], &[]).unwrap(), 0);
        assert_eq!(table_size_mixed(&[]).unwrap(), 1);
    }

    #[test]
    fn weights_match_encoding() {
        let sizes = [2, 3, 4];
        let w = weights(&sizes).unwrap();
        assert_eq!(w, vec![12, 4, 1]);
        assert!(weights(&[]).unwrap().is_empty());
    }
}
