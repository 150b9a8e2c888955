//! Command-line interface to the convolutional codec. The `encode` and `decode` subcommands read
//! one line of `0`/`1` characters from standard input and write the result to standard output;
//! the `simulate` subcommand evaluates the BER and BLER of a code over a binary symmetric channel
//! and saves the results to a JSON file.
//!
//! Build the executable with `cargo build --release` and then run `./target/release/viterbi -h`
//! for help on the command-line interface.

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

use std::io::BufRead;
use std::num::ParseIntError;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::parser::ValueSource;
use clap::{crate_name, crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing_subscriber::EnvFilter;
use viterbi::{bits, sim, Codec, CodecConfig};

/// Main function
fn main() -> ExitCode {
    init_tracing();
    let matches = match command_line_parser().try_get_matches() {
        Ok(matches) => matches,
        Err(err) => return ExitCode::from(report_clap_error(&err)),
    };
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}

/// Installs a subscriber that writes log events to standard error, filtered by `RUST_LOG`.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Runs the subcommand given on the command line.
fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        Some(("encode", sub_matches)) => {
            let codec = Codec::new(codec_config_from_matches(sub_matches)?)?;
            let message_bits = bits::bits_from_str(&read_message_line()?)?;
            println!("{}", bits::bits_to_string(&codec.encode(&message_bits)));
        }
        Some(("decode", sub_matches)) => {
            let codec = Codec::new(codec_config_from_matches(sub_matches)?)?;
            let received_bits = bits::bits_from_str(&read_message_line()?)?;
            println!("{}", bits::bits_to_string(&codec.decode(&received_bits)));
        }
        Some(("simulate", sub_matches)) => {
            let timer = Instant::now();
            let config = CodecConfig::new(
                *sub_matches.get_one("sim_constraint_len").unwrap(),
                &sub_matches
                    .get_many::<usize>("sim_polynomials")
                    .unwrap()
                    .copied()
                    .collect::<Vec<_>>(),
                sub_matches.get_flag("reverse_polynomials"),
            );
            sim::run_bsc_sims(
                &config,
                &all_sim_params(sub_matches),
                &json_filename_from_matches(sub_matches),
            )?;
            eprintln!("Elapsed time: {:.3?}", timer.elapsed());
        }
        // OK to panic: Subcommand is required and only the above subcommands exist.
        _ => unreachable!("Unknown subcommand"),
    }
    Ok(())
}

/// Returns process exit code for an error raised while running a subcommand.
fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<ParseIntError>().is_some() {
        2
    } else if let Some(viterbi::Error::InvalidConfig(_)) = err.downcast_ref::<viterbi::Error>() {
        3
    } else {
        4
    }
}

/// Prints a command-line parsing error (or help/version text), and returns the process exit code.
fn report_clap_error(err: &clap::Error) -> u8 {
    if err.print().is_err() {
        eprintln!("{err}");
    }
    clap_exit_code(err.kind())
}

/// Returns process exit code for a command-line parsing error.
fn clap_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        ErrorKind::InvalidValue | ErrorKind::ValueValidation => 2,
        _ => 1,
    }
}

/// Returns first line of standard input, without its line terminator.
fn read_message_line() -> Result<String> {
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read message from standard input")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Returns command line parser.
fn command_line_parser() -> Command {
    Command::new(crate_name!())
        .version(crate_version!())
        .about("Encodes, decodes and simulates a binary convolutional code")
        .subcommand_required(true)
        .subcommand(
            Command::new("encode")
                .about("Encodes a message read from standard input")
                .arg(reverse_polynomials())
                .arg(constraint_len())
                .arg(polynomials_and_trailing_arg()),
        )
        .subcommand(
            Command::new("decode")
                .about("Decodes received bits read from standard input")
                .arg(reverse_polynomials())
                .arg(constraint_len())
                .arg(polynomials_and_trailing_arg()),
        )
        .subcommand(
            Command::new("simulate")
                .about("Evaluates the performance of a code over a binary symmetric channel")
                .arg(sim_constraint_len())
                .arg(sim_polynomials())
                .arg(reverse_polynomials())
                .arg(num_info_bits_per_block())
                .arg(first_flip_prob())
                .arg(flip_prob_step())
                .arg(num_flip_prob())
                .arg(num_block_errors_min())
                .arg(num_blocks_per_run())
                .arg(num_runs_min())
                .arg(num_runs_max())
                .arg(json_filename()),
        )
}

/// Returns argument for polynomial reversal.
fn reverse_polynomials() -> Arg {
    Arg::new("reverse_polynomials")
        .short('r')
        .long("reverse-polynomials")
        .action(ArgAction::SetTrue)
        .help("Reverse the bit order of each polynomial")
}

/// Returns positional argument for constraint length.
fn constraint_len() -> Arg {
    Arg::new("constraint_len")
        .required(true)
        .allow_negative_numbers(true)
        .help("Constraint length")
}

/// Returns positional argument for polynomials, followed by one unused trailing argument.
fn polynomials_and_trailing_arg() -> Arg {
    Arg::new("polynomials_and_trailing_arg")
        .required(true)
        .num_args(1 ..)
        .allow_negative_numbers(true)
        .value_name("POLYNOMIAL")
        .help("Generator polynomials, followed by one trailing argument that is ignored")
}

/// Returns code parameters based on positional command-line arguments.
fn codec_config_from_matches(matches: &ArgMatches) -> Result<CodecConfig> {
    // OK to unwrap: Both arguments are required.
    let constraint_len = parse_code_param(
        matches.get_one::<String>("constraint_len").unwrap(),
        "constraint length",
    )?;
    let all_args: Vec<&String> = matches
        .get_many::<String>("polynomials_and_trailing_arg")
        .unwrap()
        .collect();
    let polynomials = all_args[.. all_args.len() - 1]
        .iter()
        .map(|text| parse_code_param(text, "polynomial"))
        .collect::<Result<Vec<_>>>()?;
    Ok(CodecConfig::new(
        constraint_len,
        &polynomials,
        matches.get_flag("reverse_polynomials"),
    ))
}

/// Returns value of a code parameter given as a decimal integer.
fn parse_code_param(text: &str, param_name: &str) -> Result<usize> {
    let value: i64 = text
        .parse()
        .with_context(|| format!("Invalid {param_name}: {text}"))?;
    Ok(usize::try_from(value).map_err(|_| {
        viterbi::Error::InvalidConfig(format!("Invalid {param_name}: {value} is negative"))
    })?)
}

/// Returns argument for constraint length of simulated code.
fn sim_constraint_len() -> Arg {
    Arg::new("sim_constraint_len")
        .short('k')
        .value_parser(value_parser!(usize))
        .default_value("7")
        .help("Constraint length")
}

/// Returns argument for polynomials of simulated code.
fn sim_polynomials() -> Arg {
    Arg::new("sim_polynomials")
        .short('g')
        .value_parser(value_parser!(usize))
        .num_args(1 ..)
        .default_values(["91", "109", "121"])
        .help("Generator polynomials")
}

/// Returns argument for number of information bits per block.
fn num_info_bits_per_block() -> Arg {
    Arg::new("num_info_bits_per_block")
        .short('i')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Number of information bits per block")
}

/// Returns argument for first flip probability.
fn first_flip_prob() -> Arg {
    Arg::new("first_flip_prob")
        .short('p')
        .value_parser(value_parser!(f64))
        .default_value("0.01")
        .help("First flip probability of the BSC")
}

/// Returns argument for flip probability step.
fn flip_prob_step() -> Arg {
    Arg::new("flip_prob_step")
        .short('d')
        .value_parser(value_parser!(f64))
        .allow_negative_numbers(true)
        .default_value("0.01")
        .help("Flip probability step")
}

/// Returns argument for number of flip probability values.
fn num_flip_prob() -> Arg {
    Arg::new("num_flip_prob")
        .short('s')
        .value_parser(value_parser!(u32))
        .default_value("4")
        .help("Number of flip probability values")
}

/// Returns argument for desired minimum number of block errors.
fn num_block_errors_min() -> Arg {
    Arg::new("num_block_errors_min")
        .short('e')
        .value_parser(value_parser!(u32))
        .default_value("100")
        .help("Desired minimum number of block errors")
}

/// Returns argument for number of blocks to be transmitted per run.
fn num_blocks_per_run() -> Arg {
    Arg::new("num_blocks_per_run")
        .short('b')
        .value_parser(value_parser!(u32))
        .default_value("1000")
        .help("Number of blocks to be transmitted per run")
}

/// Returns argument for minimum number of runs of blocks to be simulated.
fn num_runs_min() -> Arg {
    Arg::new("num_runs_min")
        .short('n')
        .value_parser(value_parser!(u32))
        .default_value("1")
        .help("Minimum number of runs of blocks to be simulated")
}

/// Returns argument for maximum number of runs of blocks to be simulated.
fn num_runs_max() -> Arg {
    Arg::new("num_runs_max")
        .short('x')
        .value_parser(value_parser!(u32))
        .default_value("10")
        .help("Maximum number of runs of blocks to be simulated")
}

/// Returns argument for name of JSON file to which results must be saved.
fn json_filename() -> Arg {
    Arg::new("json_filename")
        .short('f')
        .default_value("results.json")
        .help("Name of JSON file to which results must be saved")
}

/// Returns simulation parameters based on command-line arguments.
fn all_sim_params(matches: &ArgMatches) -> Vec<sim::SimParams> {
    let mut num_runs_min = num_runs_min_from_matches(matches);
    let mut num_runs_max = num_runs_max_from_matches(matches);
    if num_runs_min > num_runs_max {
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_min") {
            num_runs_min = num_runs_max;
        }
        if let Some(ValueSource::DefaultValue) = matches.value_source("num_runs_max") {
            num_runs_max = num_runs_min;
        }
    }
    // OK to unwrap: All simulation arguments have default values.
    all_flip_probs_from_matches(matches)
        .into_iter()
        .map(|flip_prob| sim::SimParams {
            num_info_bits_per_block: *matches.get_one("num_info_bits_per_block").unwrap(),
            flip_prob,
            num_block_errors_min: *matches.get_one("num_block_errors_min").unwrap(),
            num_blocks_per_run: *matches.get_one("num_blocks_per_run").unwrap(),
            num_runs_min,
            num_runs_max,
        })
        .collect()
}

/// Returns all flip probability values.
fn all_flip_probs_from_matches(matches: &ArgMatches) -> Vec<f64> {
    let first_flip_prob: f64 = *matches.get_one("first_flip_prob").unwrap();
    let flip_prob_step: f64 = *matches.get_one("flip_prob_step").unwrap();
    let num_flip_prob: u32 = *matches.get_one("num_flip_prob").unwrap();
    (0 .. num_flip_prob)
        .map(|n| first_flip_prob + flip_prob_step * f64::from(n))
        .collect()
}

/// Returns minimum number of runs of blocks to be simulated.
fn num_runs_min_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_min").unwrap()
}

/// Returns maximum number of runs of blocks to be simulated.
fn num_runs_max_from_matches(matches: &ArgMatches) -> u32 {
    *matches.get_one("num_runs_max").unwrap()
}

/// Returns name of JSON file to which simulation results must be saved.
fn json_filename_from_matches(matches: &ArgMatches) -> String {
    matches
        .get_one::<String>("json_filename")
        .unwrap()
        .to_string()
}

#[cfg(test)]
mod tests {
    use float_eq::assert_float_eq;

    use super::*;

    fn sim_command_line_for_test() -> Vec<&'static str> {
        vec![
            crate_name!(),
            "simulate",
            "-k",
            "5",
            "-g",
            "19",
            "29",
            "-i",
            "40",
            "-p",
            "0.02",
            "-d",
            "0.005",
            "-s",
            "3",
            "-e",
            "50",
            "-b",
            "100",
            "-n",
            "10",
            "-x",
            "20",
            "-f",
            "results.json",
        ]
    }

    fn sub_matches_for_test(args: &[&str]) -> ArgMatches {
        let matches = command_line_parser().try_get_matches_from(args).unwrap();
        matches.subcommand().unwrap().1.clone()
    }

    #[test]
    fn test_command_line_parser() {
        let parser = command_line_parser;
        assert!(parser()
            .try_get_matches_from(sim_command_line_for_test())
            .is_ok());
        assert!(parser()
            .try_get_matches_from([crate_name!(), "encode", "3", "5", "7", "x"])
            .is_ok());
        assert!(parser()
            .try_get_matches_from([crate_name!(), "decode", "-r", "3", "-5", "7", "x"])
            .is_ok());
        // Missing or unknown subcommand
        let err = parser().try_get_matches_from([crate_name!()]).unwrap_err();
        assert_eq!(clap_exit_code(err.kind()), 1);
        let err = parser()
            .try_get_matches_from([crate_name!(), "transcode", "3", "5", "7", "x"])
            .unwrap_err();
        assert_eq!(clap_exit_code(err.kind()), 1);
        // Missing positional arguments
        let err = parser()
            .try_get_matches_from([crate_name!(), "encode", "3"])
            .unwrap_err();
        assert_eq!(clap_exit_code(err.kind()), 1);
        // Malformed simulation option
        let err = parser()
            .try_get_matches_from([crate_name!(), "simulate", "-i", "forty"])
            .unwrap_err();
        assert_eq!(clap_exit_code(err.kind()), 2);
        // Help
        let err = parser()
            .try_get_matches_from([crate_name!(), "--help"])
            .unwrap_err();
        assert_eq!(clap_exit_code(err.kind()), 0);
    }

    #[test]
    fn test_report_clap_error() {
        let err = command_line_parser()
            .try_get_matches_from([crate_name!(), "--version"])
            .unwrap_err();
        assert_eq!(report_clap_error(&err), 0);
        let err = command_line_parser()
            .try_get_matches_from([crate_name!(), "encode"])
            .unwrap_err();
        assert_eq!(report_clap_error(&err), 1);
        let err = command_line_parser()
            .try_get_matches_from([crate_name!(), "simulate", "-k", "seven"])
            .unwrap_err();
        assert_eq!(report_clap_error(&err), 2);
    }

    #[test]
    fn test_codec_config_from_matches() {
        let sub_matches = sub_matches_for_test(&[crate_name!(), "encode", "3", "5", "7", "1011"]);
        let config = codec_config_from_matches(&sub_matches).unwrap();
        assert_eq!(config, CodecConfig::new(3, &[5, 7], false));
        let sub_matches = sub_matches_for_test(&[crate_name!(), "decode", "-r", "7", "91", "x"]);
        let config = codec_config_from_matches(&sub_matches).unwrap();
        assert_eq!(config, CodecConfig::new(7, &[91], true));
        // Trailing argument only
        let sub_matches = sub_matches_for_test(&[crate_name!(), "encode", "3", "x"]);
        let config = codec_config_from_matches(&sub_matches).unwrap();
        assert!(config.polynomials.is_empty());
        assert_eq!(exit_code(&anyhow::Error::from(Codec::new(config).unwrap_err())), 3);
    }

    #[test]
    fn test_codec_config_errors() {
        // Malformed numbers
        let sub_matches = sub_matches_for_test(&[crate_name!(), "encode", "three", "5", "7", "x"]);
        assert_eq!(exit_code(&codec_config_from_matches(&sub_matches).unwrap_err()), 2);
        let sub_matches = sub_matches_for_test(&[crate_name!(), "encode", "3", "5", "0x7", "x"]);
        assert_eq!(exit_code(&codec_config_from_matches(&sub_matches).unwrap_err()), 2);
        // Negative numbers
        let sub_matches = sub_matches_for_test(&[crate_name!(), "encode", "3", "-5", "7", "x"]);
        assert_eq!(exit_code(&codec_config_from_matches(&sub_matches).unwrap_err()), 3);
        let sub_matches = sub_matches_for_test(&[crate_name!(), "encode", "-3", "5", "7", "x"]);
        assert_eq!(exit_code(&codec_config_from_matches(&sub_matches).unwrap_err()), 3);
    }

    #[test]
    fn test_exit_code() {
        let err = anyhow::Error::from(viterbi::Error::InvalidConfig("bad".to_string()));
        assert_eq!(exit_code(&err), 3);
        let err = anyhow::Error::from(viterbi::Error::InvalidInput("bad".to_string()));
        assert_eq!(exit_code(&err), 4);
        let err = anyhow::Error::from("x".parse::<i64>().unwrap_err()).context("Invalid input");
        assert_eq!(exit_code(&err), 2);
        let err = anyhow::anyhow!("Failed to read message from standard input");
        assert_eq!(exit_code(&err), 4);
    }

    #[test]
    fn test_all_sim_params() {
        let sub_matches = sub_matches_for_test(&sim_command_line_for_test());
        let all_params = all_sim_params(&sub_matches);
        let all_flip_probs = [0.02, 0.025, 0.03];
        assert_eq!(all_params.len(), 3);
        for (idx, &params) in all_params.iter().enumerate() {
            assert_eq!(params.num_info_bits_per_block, 40);
            assert_float_eq!(params.flip_prob, all_flip_probs[idx], abs <= 1e-12);
            assert_eq!(params.num_block_errors_min, 50);
            assert_eq!(params.num_blocks_per_run, 100);
            assert_eq!(params.num_runs_min, 10);
            assert_eq!(params.num_runs_max, 20);
        }
        assert_eq!(
            sub_matches
                .get_many::<usize>("sim_polynomials")
                .unwrap()
                .copied()
                .collect::<Vec<_>>(),
            [19, 29]
        );
    }

    #[test]
    fn test_all_sim_params_with_default_runs() {
        let sub_matches = sub_matches_for_test(&[crate_name!(), "simulate", "-n", "50"]);
        let all_params = all_sim_params(&sub_matches);
        assert_eq!(all_params.len(), 4);
        assert_eq!(all_params[0].num_runs_min, 50);
        assert_eq!(all_params[0].num_runs_max, 50);
        let sub_matches = sub_matches_for_test(&[crate_name!(), "simulate", "-x", "0"]);
        let all_params = all_sim_params(&sub_matches);
        assert_eq!(all_params[0].num_runs_min, 0);
        assert_eq!(all_params[0].num_runs_max, 0);
    }
}
