//! Encoder and decoder for a binary convolutional code

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{bits, trellis, Bit, Error};

/// Parameters of a binary convolutional code
#[derive(Clone, Eq, PartialEq, Debug, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Constraint length `K` (shift register length plus one)
    pub constraint_len: usize,
    /// Integer representations of the generator polynomials, one per output bit
    pub polynomials: Vec<usize>,
    /// Whether the bit order of each polynomial must be reversed before use
    pub reverse_polynomials: bool,
}

impl CodecConfig {
    /// Returns code parameters (not yet validated; see [`Codec::new`]).
    ///
    /// # Parameters
    ///
    /// - `constraint_len`: Constraint length `K` of the code.
    ///
    /// - `polynomials`: Integer representations of the generator polynomials for the code, one
    ///   per output bit. With `reverse_polynomials` set to `false`, the MSB of each `K`-bit
    ///   polynomial taps the newest input bit and its LSB taps the oldest bit in the register.
    ///
    /// - `reverse_polynomials`: Whether the bit order of each polynomial must be reversed before
    ///   use (so that the LSB taps the newest input bit instead).
    #[must_use]
    pub fn new(constraint_len: usize, polynomials: &[usize], reverse_polynomials: bool) -> Self {
        Self {
            constraint_len,
            polynomials: polynomials.to_vec(),
            reverse_polynomials,
        }
    }
}

impl std::fmt::Display for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "constraint length {}, polynomials [{}]{}",
            self.constraint_len,
            self.polynomials.iter().join(", "),
            if self.reverse_polynomials {
                " (reversed)"
            } else {
                ""
            }
        )
    }
}

/// Encoder and Viterbi decoder for a binary convolutional code
///
/// A codec is immutable once built, so a single instance can serve any number of concurrent
/// encode and decode calls.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct Codec {
    /// Code parameters
    config: CodecConfig,
    /// State machine with precomputed output bits
    state_machine: trellis::StateMachine,
}

impl Codec {
    /// Returns codec for given code parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the constraint length is not in the range
    /// `[2, MAX_CONSTRAINT_LEN]`, if there are no polynomials, or if any polynomial is not in the
    /// range `(0, 2^K)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::{Codec, CodecConfig};
    ///
    /// let codec = Codec::new(CodecConfig::new(3, &[5, 7], false))?;
    /// assert!(Codec::new(CodecConfig::new(3, &[5, 8], false)).is_err());
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(config: CodecConfig) -> Result<Self, Error> {
        let state_machine = trellis::StateMachine::new(
            config.constraint_len,
            &config.polynomials,
            config.reverse_polynomials,
        )?;
        tracing::debug!(%config, "built convolutional codec");
        Ok(Self {
            config,
            state_machine,
        })
    }

    /// Returns code parameters.
    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Returns number of code bits produced for given number of message bits.
    #[must_use]
    pub fn num_code_bits(&self, num_message_bits: usize) -> usize {
        (num_message_bits + self.state_machine.memory_len) * self.state_machine.num_output_bits
    }

    /// Returns code bits for given message bits, including those for the `K - 1` tail bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::{bits, Codec, CodecConfig};
    ///
    /// let codec = Codec::new(CodecConfig::new(3, &[5, 7], false))?;
    /// let code_bits = codec.encode(&bits::bits_from_str("1011")?);
    /// assert_eq!(bits::bits_to_string(&code_bits), "110100101011");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn encode(&self, message_bits: &[Bit]) -> Vec<Bit> {
        let mut code_bits = Vec::with_capacity(self.num_code_bits(message_bits.len()));
        trellis::encode(message_bits, &self.state_machine, &mut code_bits);
        code_bits
    }

    /// Returns most likely message bits for given received code bits.
    ///
    /// Decoding never fails: an incomplete last group of received bits is padded with `Zero`
    /// bits, and the result is empty if there are no more groups than tail bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::{bits, Codec, CodecConfig};
    ///
    /// let codec = Codec::new(CodecConfig::new(3, &[5, 7], false))?;
    /// let received_bits = bits::bits_from_str("110000101011")?; // One bit in error
    /// assert_eq!(bits::bits_to_string(&codec.decode(&received_bits)), "1011");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[must_use]
    pub fn decode(&self, received_bits: &[Bit]) -> Vec<Bit> {
        trellis::decode(received_bits, &self.state_machine)
    }

    /// Returns code bits for the message bits of given bytes (MSB first).
    #[must_use]
    pub fn encode_bytes(&self, bytes: &[u8]) -> Vec<Bit> {
        self.encode(&bits::bytes_to_bits(bytes))
    }

    /// Returns bytes whose bits (MSB first) are the decoded message bits.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of decoded message bits is not a multiple of `8`.
    ///
    /// # Examples
    ///
    /// ```
    /// use viterbi::{Codec, CodecConfig};
    ///
    /// let codec = Codec::new(CodecConfig::new(7, &[91, 109, 121], false))?;
    /// let code_bits = codec.encode_bytes(b"FEC");
    /// assert_eq!(codec.decode_bytes(&code_bits)?, b"FEC");
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn decode_bytes(&self, received_bits: &[Bit]) -> Result<Vec<u8>, Error> {
        bits::bits_to_bytes(&self.decode(received_bits))
    }

    /// Returns code bits packed into bytes (MSB first) for the message bits of given bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of code bits is not a multiple of `8`.
    pub fn encode_bytes_to_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        bits::bits_to_bytes(&self.encode_bytes(bytes))
    }

    /// Returns decoded message bits packed into bytes, for code bits packed into given bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the number of decoded message bits is not a multiple of `8`.
    pub fn decode_bytes_to_bytes(&self, bytes: &[u8]) -> Result<Vec<u8>, Error> {
        self.decode_bytes(&bits::bytes_to_bits(bytes))
    }
}
