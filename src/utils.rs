//! # Some useful functions for simulating code performance
//!
//! The [`random_bits`] function returns a given number of random bits; the [`flip_random_bits`]
//! function flips a given number of bits at distinct random positions; the [`bsc_channel`]
//! function returns the output of a binary symmetric channel (BSC) for given input bits; and the
//! [`error_count`] function returns the number of errors in a sequence with respect to a
//! reference sequence.
//!
//! # Examples
//!
//! The code below illustrates the usage of the functions in this module.
//! ```
//! use viterbi::utils;
//!
//! let num_bits = 40;
//! let flip_prob = 0.01;
//! let bits = utils::random_bits(num_bits);
//! let bits_hat = utils::bsc_channel(&bits, flip_prob)?;
//! let err_count = utils::error_count(&bits_hat, &bits);
//! let bits_hat = utils::flip_random_bits(&bits, 3);
//! assert_eq!(utils::error_count(&bits_hat, &bits), 3);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use rand::Rng;
use rand_distr::{Binomial, Distribution};

use crate::{Bit, Error};

/// Returns given number of random bits.
///
/// # Parameters
///
/// - `num_bits`: Number of random bits to be generated.
///
/// # Returns
///
/// - `bits`: Random bits.
#[must_use]
pub fn random_bits(num_bits: usize) -> Vec<Bit> {
    let mut rng = rand::rng();
    (0 .. num_bits)
        .map(|_| {
            if rng.random_bool(0.5) {
                Bit::One
            } else {
                Bit::Zero
            }
        })
        .collect()
}

/// Returns copy of given bits with a given number of them flipped.
///
/// # Parameters
///
/// - `bits`: Bits to be copied.
///
/// - `num_flips`: Number of bits to be flipped. The positions are distinct and chosen uniformly at
///   random. If this exceeds `bits.len()`, then all bits are flipped.
///
/// # Returns
///
/// - `bits_hat`: Bits with the chosen positions flipped.
#[must_use]
pub fn flip_random_bits(bits: &[Bit], num_flips: usize) -> Vec<Bit> {
    let mut bits_hat = bits.to_vec();
    let num_flips = num_flips.min(bits.len());
    for idx in rand::seq::index::sample(&mut rand::rng(), bits.len(), num_flips) {
        bits_hat[idx] = !bits_hat[idx];
    }
    bits_hat
}

/// Returns output of a binary symmetric channel (BSC) for given input bits.
///
/// # Parameters
///
/// - `bits`: Bits to be transmitted over the BSC.
///
/// - `flip_prob`: Probability with which the BSC flips each bit, independently of all others.
///
/// # Returns
///
/// - `bits_hat`: Bits at the BSC output.
///
/// # Errors
///
/// Returns an error if `flip_prob` is not in the range `[0, 1]`.
pub fn bsc_channel(bits: &[Bit], flip_prob: f64) -> Result<Vec<Bit>, Error> {
    // OK to cast `usize` to `u64`: Lossless on all supported targets.
    let binomial = Binomial::new(bits.len() as u64, flip_prob).map_err(|e| {
        Error::InvalidInput(format!("Invalid flip probability {flip_prob} ({e})"))
    })?;
    let num_flips = usize::try_from(binomial.sample(&mut rand::rng())).unwrap_or(bits.len());
    Ok(flip_random_bits(bits, num_flips))
}

/// Returns number of errors in a sequence with respect to a reference sequence.
///
/// # Parameters
///
/// - `seq`: Sequence in which errors must be counted.
///
/// - `ref_seq`: Reference sequence to which the given sequence is compared.
///
/// # Returns
///
/// - `err_count`: Number of positions in which the two sequences differ. If they are of different
///   lengths, then the longer sequence is effectively truncated to the length of the shorter one.
pub fn error_count<T: PartialEq>(seq: &[T], ref_seq: &[T]) -> usize {
    ref_seq
        .iter()
        .zip(seq.iter())
        .filter(|&(x, y)| x != y)
        .count()
}
