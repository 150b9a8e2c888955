//! Simulator to evaluate performance of a convolutional code over a binary symmetric channel
//!
//! Each simulated block carries random message bits through the encoder, a binary symmetric
//! channel (BSC) and the Viterbi decoder. Blocks are simulated in runs, with the blocks of a run
//! processed in parallel by a single shared [`Codec`].
//!
//! # Examples
//!
//! ```
//! use viterbi::{sim, Codec, CodecConfig};
//!
//! let codec = Codec::new(CodecConfig::new(7, &[91, 109, 121], false))?;
//! let params = sim::SimParams {
//!     num_info_bits_per_block: 64,
//!     flip_prob: 0.0,
//!     num_block_errors_min: 0,
//!     num_blocks_per_run: 20,
//!     num_runs_min: 1,
//!     num_runs_max: 2,
//! };
//! let results = sim::bsc_sim(&codec, &params)?;
//! assert_eq!(results.num_blocks, 20);
//! assert_eq!(results.num_block_errors, 0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::fs::File;
use std::io::{BufReader, BufWriter};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{utils, Codec, CodecConfig, Error};

/// Parameters for convolutional code simulation over BSC
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimParams {
    /// Number of information bits per block
    pub num_info_bits_per_block: u32,
    /// Probability with which the BSC flips each code bit
    pub flip_prob: f64,
    /// Desired minimum number of block errors
    pub num_block_errors_min: u32,
    /// Number of blocks to be transmitted per run
    pub num_blocks_per_run: u32,
    /// Minimum number of runs of blocks to be simulated
    pub num_runs_min: u32,
    /// Maximum number of runs of blocks to be simulated
    pub num_runs_max: u32,
}

/// Results from convolutional code simulation over BSC
#[derive(Clone, PartialEq, Debug, Copy, Deserialize, Serialize)]
pub struct SimResults {
    /// Simulation parameters
    pub params: SimParams,
    /// Number of blocks transmitted
    pub num_blocks: u64,
    /// Number of information bits transmitted
    pub num_info_bits: u64,
    /// Number of block errors
    pub num_block_errors: u64,
    /// Number of information bit errors
    pub num_info_bit_errors: u64,
}

impl SimResults {
    /// Returns initialized simulation results.
    fn new(params: &SimParams) -> Self {
        Self {
            params: *params,
            num_blocks: 0,
            num_info_bits: 0,
            num_block_errors: 0,
            num_info_bit_errors: 0,
        }
    }

    /// Returns block error rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn block_error_rate(&self) -> f64 {
        if self.num_blocks > 0 {
            self.num_block_errors as f64 / self.num_blocks as f64
        } else {
            0.0
        }
    }

    /// Returns information bit error rate.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bit_error_rate(&self) -> f64 {
        if self.num_info_bits > 0 {
            self.num_info_bit_errors as f64 / self.num_info_bits as f64
        } else {
            0.0
        }
    }

    /// Returns number of runs completed so far.
    fn num_runs(&self) -> u64 {
        self.num_blocks / u64::from(self.params.num_blocks_per_run)
    }

    /// Returns `true` iff enough runs have been simulated.
    fn run_complete(&self) -> bool {
        let num_runs = self.num_runs();
        num_runs >= u64::from(self.params.num_runs_max)
            || (num_runs >= u64::from(self.params.num_runs_min)
                && self.num_block_errors >= u64::from(self.params.num_block_errors_min))
    }

    /// Updates simulation results after a run, given the bit error count of each of its blocks.
    fn update_after_run(&mut self, all_block_bit_errors: &[usize]) {
        for &num_bit_errors in all_block_bit_errors {
            self.num_blocks += 1;
            self.num_info_bits += u64::from(self.params.num_info_bits_per_block);
            if num_bit_errors > 0 {
                self.num_block_errors += 1;
                // OK to cast `usize` to `u64`: Lossless on all supported targets.
                self.num_info_bit_errors += num_bit_errors as u64;
            }
        }
    }
}

impl std::fmt::Display for SimResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "p = {:.4}: {} block errors in {} blocks (BLER {:.3e}), BER {:.3e}",
            self.params.flip_prob,
            self.num_block_errors,
            self.num_blocks,
            self.block_error_rate(),
            self.bit_error_rate()
        )
    }
}

/// Report of all simulations run for a code
#[derive(Clone, PartialEq, Debug, Deserialize, Serialize)]
pub struct SimReport {
    /// Code parameters
    pub config: CodecConfig,
    /// Results for all simulation parameters
    pub all_results: Vec<SimResults>,
}

/// Runs simulations of a convolutional code over BSC, and saves results to a JSON file.
///
/// # Parameters
///
/// - `config`: Parameters of the code to be simulated.
///
/// - `all_params`: Parameters for each simulation scenario of interest.
///
/// - `json_filename`: Name of the JSON file to which the [`SimReport`] must be written.
///
/// # Errors
///
/// Returns an error if the code parameters are invalid, if any simulation parameters are
/// invalid, or if the report cannot be written to the JSON file.
pub fn run_bsc_sims(
    config: &CodecConfig,
    all_params: &[SimParams],
    json_filename: &str,
) -> Result<(), Error> {
    let codec = Codec::new(config.clone())?;
    let all_results = all_params
        .iter()
        .map(|params| bsc_sim(&codec, params))
        .collect::<Result<Vec<_>, _>>()?;
    save_sim_report(
        &SimReport {
            config: config.clone(),
            all_results,
        },
        json_filename,
    )
}

/// Runs simulation of a convolutional code over BSC.
///
/// # Parameters
///
/// - `codec`: Codec for the code to be simulated.
///
/// - `params`: Simulation parameters.
///
/// # Returns
///
/// - `results`: Simulation results.
///
/// # Errors
///
/// Returns an error if the simulation parameters are invalid.
pub fn bsc_sim(codec: &Codec, params: &SimParams) -> Result<SimResults, Error> {
    check_sim_params(params)?;
    let mut results = SimResults::new(params);
    while !results.run_complete() {
        let all_block_bit_errors = (0 .. params.num_blocks_per_run)
            .into_par_iter()
            .map(|_| block_bit_errors(codec, params))
            .collect::<Result<Vec<_>, _>>()?;
        results.update_after_run(&all_block_bit_errors);
        tracing::debug!(num_runs = results.num_runs(), %results, "completed run");
    }
    tracing::info!(%results, "completed simulation");
    Ok(results)
}

/// Reads report of simulations from a JSON file.
///
/// # Errors
///
/// Returns an error if the JSON file cannot be opened or does not hold a valid report.
pub fn read_sim_report(json_filename: &str) -> Result<SimReport, Error> {
    let reader = BufReader::new(File::open(json_filename)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Saves report of simulations to a JSON file.
fn save_sim_report(report: &SimReport, json_filename: &str) -> Result<(), Error> {
    let writer = BufWriter::new(File::create(json_filename)?);
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Returns number of information bit errors in one simulated block.
fn block_bit_errors(codec: &Codec, params: &SimParams) -> Result<usize, Error> {
    // OK to cast `u32` to `usize`: Lossless on all supported targets.
    let info_bits = utils::random_bits(params.num_info_bits_per_block as usize);
    let code_bits = codec.encode(&info_bits);
    let received_bits = utils::bsc_channel(&code_bits, params.flip_prob)?;
    let info_bits_hat = codec.decode(&received_bits);
    Ok(utils::error_count(&info_bits_hat, &info_bits))
}

/// Checks validity of simulation parameters.
fn check_sim_params(params: &SimParams) -> Result<(), Error> {
    if params.num_blocks_per_run == 0 {
        return Err(Error::InvalidInput(
            "Number of blocks per run cannot be zero".to_string(),
        ));
    }
    if params.num_runs_min > params.num_runs_max {
        return Err(Error::InvalidInput(format!(
            "Minimum number of runs ({}) exceeds maximum number of runs ({})",
            params.num_runs_min, params.num_runs_max
        )));
    }
    if !(0.0 ..= 1.0).contains(&params.flip_prob) {
        return Err(Error::InvalidInput(format!(
            "Flip probability must be in the range [0, 1], found {}",
            params.flip_prob
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests_of_sim_results {
    use float_eq::assert_float_eq;

    use super::*;

    fn params_for_test() -> SimParams {
        SimParams {
            num_info_bits_per_block: 40,
            flip_prob: 0.05,
            num_block_errors_min: 10,
            num_blocks_per_run: 100,
            num_runs_min: 2,
            num_runs_max: 4,
        }
    }

    #[test]
    fn test_new() {
        let results = SimResults::new(&params_for_test());
        assert_eq!(results.params, params_for_test());
        assert_eq!(results.num_blocks, 0);
        assert_eq!(results.num_info_bits, 0);
        assert_eq!(results.num_block_errors, 0);
        assert_eq!(results.num_info_bit_errors, 0);
        assert_float_eq!(results.block_error_rate(), 0.0, abs <= 1e-12);
        assert_float_eq!(results.bit_error_rate(), 0.0, abs <= 1e-12);
    }

    #[test]
    fn test_update_after_run() {
        let mut results = SimResults::new(&params_for_test());
        let mut all_block_bit_errors = vec![0; 100];
        all_block_bit_errors[3] = 2;
        all_block_bit_errors[50] = 6;
        results.update_after_run(&all_block_bit_errors);
        assert_eq!(results.num_blocks, 100);
        assert_eq!(results.num_info_bits, 4000);
        assert_eq!(results.num_block_errors, 2);
        assert_eq!(results.num_info_bit_errors, 8);
        assert_eq!(results.num_runs(), 1);
        assert_float_eq!(results.block_error_rate(), 0.02, abs <= 1e-12);
        assert_float_eq!(results.bit_error_rate(), 0.002, abs <= 1e-12);
    }

    #[test]
    fn test_run_complete() {
        let mut results = SimResults::new(&params_for_test());
        assert!(!results.run_complete());
        // Enough block errors, but too few runs
        results.update_after_run(&[1; 100]);
        assert!(!results.run_complete());
        results.update_after_run(&[0; 100]);
        assert!(results.run_complete());
        // Too few block errors until the maximum number of runs
        let mut results = SimResults::new(&params_for_test());
        for _ in 0 .. 3 {
            results.update_after_run(&[0; 100]);
            assert!(!results.run_complete());
        }
        results.update_after_run(&[0; 100]);
        assert!(results.run_complete());
    }

    #[test]
    fn test_counts_beyond_u32_range() {
        let params = SimParams {
            num_block_errors_min: 200,
            num_runs_min: 1,
            num_runs_max: u32::MAX,
            ..params_for_test()
        };
        let num_runs = u64::from(u32::MAX / 100);
        let mut results = SimResults {
            num_blocks: 100 * num_runs,
            num_info_bits: 4000 * num_runs,
            ..SimResults::new(&params)
        };
        results.update_after_run(&[1; 100]);
        assert_eq!(results.num_blocks, 100 * num_runs + 100);
        assert!(results.num_blocks > u64::from(u32::MAX));
        assert_eq!(results.num_block_errors, 100);
        assert_eq!(results.num_runs(), num_runs + 1);
        assert!(!results.run_complete());
        results.update_after_run(&[1; 100]);
        assert_eq!(results.num_block_errors, 200);
        assert!(results.run_complete());
    }

    #[test]
    fn test_display() {
        let mut results = SimResults::new(&params_for_test());
        let mut all_block_bit_errors = vec![0; 100];
        all_block_bit_errors[0] = 4;
        results.update_after_run(&all_block_bit_errors);
        assert_eq!(
            results.to_string(),
            "p = 0.0500: 1 block errors in 100 blocks (BLER 1.000e-2), BER 1.000e-3"
        );
    }
}
