//! This crate implements encoding and decoding functionality for a binary convolutional code of
//! rate `1/N`. The encoder runs each message bit through a shift register of length `K - 1` (for
//! a code of constraint length `K`) and emits one parity bit per generator polynomial; `K - 1`
//! zero tail bits flush the register at the end of the message. The decoder is a hard-decision
//! Viterbi decoder, which finds the message whose code bits are closest in Hamming distance to the
//! received bits.
//!
//! # Examples
//!
//! ```
//! use viterbi::{bits, Codec, CodecConfig};
//!
//! let codec = Codec::new(CodecConfig::new(7, &[91, 109, 121], false))?;
//! let message = bits::bytes_to_bits(b"Hi");
//! let mut code_bits = codec.encode(&message);
//! code_bits[5] = !code_bits[5];
//! assert_eq!(codec.decode(&code_bits), message);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(
    clippy::complexity,
    clippy::pedantic,
    clippy::perf,
    clippy::style,
    clippy::suspicious,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_allocation,
    unused_import_braces,
    unused_qualifications
)]

pub mod bits;
pub mod sim;
pub mod utils;
mod codec;
mod trellis;

pub use codec::{Codec, CodecConfig};
pub use trellis::MAX_CONSTRAINT_LEN;

/// Custom error type
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Invalid codec configuration error
    #[error("{0}")]
    InvalidConfig(String),
    /// Bit/byte conversion error
    #[error("{0}")]
    InvalidConversion(String),
    /// Invalid input error
    #[error("{0}")]
    InvalidInput(String),
    /// File read/write error
    #[error("{0}")]
    FileReadWriteError(#[from] std::io::Error),
    /// Serde read/write error
    #[error("{0}")]
    SerdeReadWriteError(#[from] serde_json::Error),
}

/// Enumeration of binary symbol values
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
pub enum Bit {
    /// Binary symbol `0`
    Zero = 0,
    /// Binary symbol `1`
    One = 1,
}

impl std::ops::Not for Bit {
    type Output = Bit;

    fn not(self) -> Self::Output {
        match self {
            Bit::Zero => Bit::One,
            Bit::One => Bit::Zero,
        }
    }
}

impl From<Bit> for u8 {
    fn from(bit: Bit) -> Self {
        match bit {
            Bit::Zero => 0,
            Bit::One => 1,
        }
    }
}

impl From<Bit> for char {
    fn from(bit: Bit) -> Self {
        match bit {
            Bit::Zero => '0',
            Bit::One => '1',
        }
    }
}

impl TryFrom<char> for Bit {
    type Error = Error;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '0' => Ok(Bit::Zero),
            '1' => Ok(Bit::One),
            _ => Err(Error::InvalidInput(format!(
                "Expected bit character '0' or '1', found {c:?}"
            ))),
        }
    }
}
