//! Fixed-width float encoding of cluster centers.
//!
//! The model term of the description length is the storage size of the centers
//! once every coordinate is written at a chosen float width.

use crate::error::{Error, Result};
use half::f16;
use log::warn;
use serde::{Deserialize, Serialize};

/// Storage width for one center coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FloatPrecision {
    /// IEEE 754 binary16.
    #[default]
    Half,
    /// IEEE 754 binary32.
    Single,
    /// IEEE 754 binary64.
    Double,
}

impl FloatPrecision {
    /// Map a bit width (16, 32 or 64) to a precision.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            16 => Ok(Self::Half),
            32 => Ok(Self::Single),
            64 => Ok(Self::Double),
            _ => Err(Error::InvalidParameter {
                name: "float_precision_bits",
                message: "must be 16, 32 or 64",
            }),
        }
    }

    /// Bits used per stored value.
    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            Self::Half => 16,
            Self::Single => 32,
            Self::Double => 64,
        }
    }

    /// Round `x` to the nearest value representable at this width.
    pub fn quantize(self, x: f64) -> f64 {
        match self {
            Self::Half => f16::from_f64(x).to_f64(),
            Self::Single => f64::from(x as f32),
            Self::Double => x,
        }
    }

    fn write(self, x: f64, out: &mut Vec<u8>) {
        match self {
            Self::Half => out.extend_from_slice(&f16::from_f64(x).to_le_bytes()),
            Self::Single => out.extend_from_slice(&(x as f32).to_le_bytes()),
            Self::Double => out.extend_from_slice(&x.to_le_bytes()),
        }
    }
}

impl TryFrom<u32> for FloatPrecision {
    type Error = Error;

    fn try_from(bits: u32) -> Result<Self> {
        Self::from_bits(bits)
    }
}

impl From<FloatPrecision> for u32 {
    fn from(p: FloatPrecision) -> u32 {
        p.bits()
    }
}

/// Encode all center coordinates, row by row, as little-endian values of `precision`.
///
/// Coordinates that do not fit the width (e.g. above 65504 for half precision) are
/// stored as infinities and reported with a warning.
pub fn encode_centers(centers: &[Vec<f64>], precision: FloatPrecision) -> Vec<u8> {
    let n_values: usize = centers.iter().map(Vec::len).sum();
    let mut out = Vec::with_capacity(n_values * (precision.bits() as usize / 8));
    let mut overflowed = 0usize;

    for &x in centers.iter().flatten() {
        if x.is_finite() && !precision.quantize(x).is_finite() {
            overflowed += 1;
        }
        precision.write(x, &mut out);
    }

    if overflowed > 0 {
        warn!(
            "{overflowed} of {n_values} center coordinates overflow {}-bit floats",
            precision.bits()
        );
    }
    out
}
