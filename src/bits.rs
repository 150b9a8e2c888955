//! # Conversions between bits, bytes and text
//!
//! The [`bytes_to_bits`] function expands bytes into bits (MSB first), and the [`bits_to_bytes`]
//! function packs bits back into bytes; the [`bits_from_str`] and [`bits_to_string`] functions
//! convert between bits and their text form as a string of `0` and `1` characters.
//!
//! # Examples
//!
//! ```
//! use viterbi::bits;
//!
//! let bits = bits::bytes_to_bits(&[0xA5]);
//! assert_eq!(bits::bits_to_string(&bits), "10100101");
//! assert_eq!(bits::bits_to_bytes(&bits)?, [0xA5]);
//! assert_eq!(bits::bits_from_str("10100101")?, bits);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::{Bit, Error};

/// Returns bits of given bytes, MSB of each byte first.
#[must_use]
pub fn bytes_to_bits(bytes: &[u8]) -> Vec<Bit> {
    bytes
        .iter()
        .flat_map(|&byte| {
            (0 .. 8).rev().map(move |k| {
                if (byte >> k) & 1 == 0 {
                    Bit::Zero
                } else {
                    Bit::One
                }
            })
        })
        .collect()
}

/// Returns bytes packed from given bits, MSB of each byte first.
///
/// # Errors
///
/// Returns an error if the number of bits is not a multiple of `8`.
pub fn bits_to_bytes(bits: &[Bit]) -> Result<Vec<u8>, Error> {
    if bits.len() % 8 != 0 {
        return Err(Error::InvalidConversion(format!(
            "Number of bits must be a multiple of 8 (found {})",
            bits.len()
        )));
    }
    Ok(bits
        .chunks_exact(8)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0, |byte, &bit| (byte << 1) | u8::from(bit))
        })
        .collect())
}

/// Returns bits given by a string of `0` and `1` characters.
///
/// # Errors
///
/// Returns an error if the string contains any other character.
pub fn bits_from_str(text: &str) -> Result<Vec<Bit>, Error> {
    text.chars().map(Bit::try_from).collect()
}

/// Returns string of `0` and `1` characters for given bits.
#[must_use]
pub fn bits_to_string(bits: &[Bit]) -> String {
    bits.iter().map(|&bit| char::from(bit)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use Bit::{One, Zero};

    #[test]
    fn test_bytes_to_bits() {
        assert!(bytes_to_bits(&[]).is_empty());
        assert_eq!(
            bytes_to_bits(&[0x80, 0x01]),
            [
                One, Zero, Zero, Zero, Zero, Zero, Zero, Zero, Zero, Zero, Zero, Zero, Zero, Zero,
                Zero, One
            ]
        );
        assert_eq!(
            bytes_to_bits(&[0x5C]),
            [Zero, One, Zero, One, One, One, Zero, Zero]
        );
    }

    #[test]
    fn test_bits_to_bytes() {
        assert!(bits_to_bytes(&[]).unwrap().is_empty());
        assert_eq!(
            bits_to_bytes(&[Zero, One, Zero, One, One, One, Zero, Zero]).unwrap(),
            [0x5C]
        );
        assert!(matches!(
            bits_to_bytes(&[One, Zero, One]),
            Err(Error::InvalidConversion(_))
        ));
        assert!(matches!(
            bits_to_bytes(&[Zero; 9]),
            Err(Error::InvalidConversion(_))
        ));
    }

    #[test]
    fn test_bytes_bits_bytes() {
        let bytes: Vec<u8> = (0 ..= 255).collect();
        let bits = bytes_to_bits(&bytes);
        assert_eq!(bits.len(), 8 * bytes.len());
        assert_eq!(bits_to_bytes(&bits).unwrap(), bytes);
    }

    #[test]
    fn test_bits_from_str() {
        assert!(bits_from_str("").unwrap().is_empty());
        assert_eq!(bits_from_str("0110").unwrap(), [Zero, One, One, Zero]);
        assert!(matches!(bits_from_str("01x0"), Err(Error::InvalidInput(_))));
        assert!(bits_from_str("0 1").is_err());
    }

    #[test]
    fn test_bits_to_string() {
        assert_eq!(bits_to_string(&[]), "");
        assert_eq!(bits_to_string(&[One, Zero, Zero, One]), "1001");
    }
}
