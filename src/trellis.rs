//! State machine, encoder and Viterbi decoder for a binary convolutional code

use crate::{utils, Bit, Error};

/// Largest constraint length accepted (output table and trellis sizes grow as `2^K`)
pub const MAX_CONSTRAINT_LEN: usize = 16;

/// Path metric of a state that no path has reached yet
const UNREACHED: usize = usize::MAX;

/// State of an encoder/decoder (the last `K - 1` input bits, newest bit as MSB)
#[derive(Clone, Eq, PartialEq, Debug, Copy)]
struct State(usize);

/// State machine for encoder/decoder
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) struct StateMachine {
    /// Memory length
    pub(crate) memory_len: usize,
    /// Number of states
    pub(crate) num_states: usize,
    /// Number of output bits
    pub(crate) num_output_bits: usize,
    /// Output bits for each augmented state index (`num_output_bits` bits per index)
    outputs: Vec<Bit>,
}

impl StateMachine {
    /// Returns state machine for encoder/decoder corresponding to given code parameters.
    ///
    /// # Parameters
    ///
    /// - `constraint_len`: Constraint length `K` of the code. Must be in the range
    ///   `[2, MAX_CONSTRAINT_LEN]`.
    ///
    /// - `code_polynomials`: Integer representations of the generator polynomials for the code.
    ///   Must have length `N >= 1` for a code of rate `1/N`, and each polynomial must be in the
    ///   range `(0, 2^K)`.
    ///
    /// - `reverse_polynomials`: Whether the bit order of each polynomial must be reversed before
    ///   use.
    ///
    /// # Errors
    ///
    /// Returns an error if the constraint length is out of range, if there are no code
    /// polynomials, or if any code polynomial is out of range. No output bits are computed in
    /// that case.
    ///
    /// # Notes
    ///
    /// The augmented state index for state `s` and input bit `x` is `s + x * 2^(K-1)`, so that
    /// its MSB is the newest input bit and its LSB is the oldest bit in the register. Output bit
    /// `n` is the XOR of the augmented state index bits selected by the tap mask of polynomial
    /// `n`. If `reverse_polynomials` is `false`, the tap mask is the `K`-bit reversal of the
    /// polynomial (the polynomial MSB taps the newest input bit); otherwise it is the polynomial
    /// itself. The output bits are read out in polynomial order.
    pub(crate) fn new(
        constraint_len: usize,
        code_polynomials: &[usize],
        reverse_polynomials: bool,
    ) -> Result<Self, Error> {
        check_code_params(constraint_len, code_polynomials)?;
        let tap_masks: Vec<usize> = code_polynomials
            .iter()
            .map(|&poly| {
                if reverse_polynomials {
                    poly
                } else {
                    reverse_bits(poly, constraint_len)
                }
            })
            .collect();
        let outputs = (0 .. 1 << constraint_len)
            .flat_map(|aug_state_index: usize| {
                tap_masks
                    .iter()
                    .map(move |&tap_mask| bitxor(aug_state_index & tap_mask))
            })
            .collect();
        Ok(Self {
            memory_len: constraint_len - 1,
            num_states: 1 << (constraint_len - 1),
            num_output_bits: code_polynomials.len(),
            outputs,
        })
    }

    /// Returns output bits for given state and input bit.
    fn output_bits(&self, state: State, input_bit: Bit) -> &[Bit] {
        let start = self.augmented_state_index(state, input_bit) * self.num_output_bits;
        &self.outputs[start .. start + self.num_output_bits]
    }

    /// Returns next state for given state and input bit.
    fn next_state(&self, state: State, input_bit: Bit) -> State {
        State(self.augmented_state_index(state, input_bit) >> 1)
    }

    /// Returns the two states from which a single transition leads to given state.
    fn previous_states(&self, state: State) -> (State, State) {
        let prev_state_index = (state.0 << 1) & (self.num_states - 1);
        (State(prev_state_index), State(prev_state_index | 1))
    }

    /// Returns input bit that must have caused the transition into given state.
    fn input_bit_into(&self, state: State) -> Bit {
        bit_from_index(state.0 >> (self.memory_len - 1))
    }

    /// Returns integer obtained by augmenting given state on the left with given input bit.
    fn augmented_state_index(&self, state: State, input_bit: Bit) -> usize {
        match input_bit {
            Bit::Zero => state.0,
            Bit::One => self.num_states + state.0,
        }
    }
}

/// Calculator for path metrics
#[derive(Debug)]
struct PathMetricCalculator {
    /// Path metrics for all states at current time instant
    path_metrics: Vec<usize>,
    /// Path metrics for all states at next time instant
    path_metrics_next: Vec<usize>,
}

impl PathMetricCalculator {
    /// Returns new calculator, with only the all-zero state reached.
    fn new(num_states: usize) -> Self {
        let mut path_metrics = vec![UNREACHED; num_states];
        path_metrics[0] = 0;
        Self {
            path_metrics,
            path_metrics_next: vec![UNREACHED; num_states],
        }
    }

    /// Returns metric of the path into a state through given previous state.
    fn candidate_metric(
        &self,
        received_bits: &[Bit],
        state_machine: &StateMachine,
        prev_state: State,
        state: State,
    ) -> usize {
        match self.path_metrics[prev_state.0] {
            UNREACHED => UNREACHED,
            metric => metric + branch_metric(received_bits, state_machine, prev_state, state),
        }
    }

    /// Updates path metrics for the next time instant.
    fn update_path_metrics(&mut self) {
        std::mem::swap(&mut self.path_metrics, &mut self.path_metrics_next);
    }
}

/// Trellis of survivor decisions, one column of previous states per time instant
#[derive(Debug)]
struct Trellis {
    /// Number of states per column
    num_states: usize,
    /// Previous state chosen for each state, column after column
    prev_states: Vec<State>,
}

impl Trellis {
    /// Returns trellis with given number of columns, all sized up front.
    fn new(num_states: usize, num_columns: usize) -> Self {
        Self {
            num_states,
            prev_states: vec![State(0); num_states * num_columns],
        }
    }

    /// Returns mutable column for given time instant.
    fn column_mut(&mut self, time: usize) -> &mut [State] {
        &mut self.prev_states[time * self.num_states .. (time + 1) * self.num_states]
    }

    /// Returns number of columns.
    fn num_columns(&self) -> usize {
        self.prev_states.len() / self.num_states
    }
}

/// Workspace for decoder
#[derive(Debug)]
struct DecoderWorkspace {
    /// Calculator for path metrics of all states
    pm_calc: PathMetricCalculator,
    /// Survivor decisions for all time instants
    trellis: Trellis,
    /// Buffer for received bits of one time instant (zero-padded if incomplete)
    received_bits: Vec<Bit>,
}

impl DecoderWorkspace {
    /// Returns new workspace for decoding given number of time instants.
    fn new(state_machine: &StateMachine, num_columns: usize) -> Self {
        Self {
            pm_calc: PathMetricCalculator::new(state_machine.num_states),
            trellis: Trellis::new(state_machine.num_states, num_columns),
            received_bits: vec![Bit::Zero; state_machine.num_output_bits],
        }
    }

    /// Loads received bits for one time instant, padding with `Zero` if there are too few.
    fn load_received_bits(&mut self, chunk: &[Bit]) {
        self.received_bits[.. chunk.len()].copy_from_slice(chunk);
        self.received_bits[chunk.len() ..].fill(Bit::Zero);
    }
}

/// Checks validity of code parameters.
fn check_code_params(constraint_len: usize, code_polynomials: &[usize]) -> Result<(), Error> {
    if !(2 ..= MAX_CONSTRAINT_LEN).contains(&constraint_len) {
        return Err(Error::InvalidConfig(format!(
            "Constraint length must be in the range [2, {MAX_CONSTRAINT_LEN}], found \
            {constraint_len}",
        )));
    }
    if code_polynomials.is_empty() {
        return Err(Error::InvalidConfig(
            "Expected at least one code polynomial".to_string(),
        ));
    }
    let two_pow_constraint_len = 1 << constraint_len;
    if let Some(&poly) = code_polynomials
        .iter()
        .find(|&&x| x == 0 || x >= two_pow_constraint_len)
    {
        return Err(Error::InvalidConfig(format!(
            "For constraint length of {constraint_len}, each code polynomial must be in the \
            range (0, {two_pow_constraint_len}), found {poly}",
        )));
    }
    Ok(())
}

/// Returns integer whose `num_bits` low-order bits are those of given integer in reverse order.
fn reverse_bits(num: usize, num_bits: usize) -> usize {
    (0 .. num_bits).fold(0, |rev, k| (rev << 1) | ((num >> k) & 1))
}

/// Returns XOR of bits in the binary representation of given integer.
fn bitxor(num: usize) -> Bit {
    match num.count_ones() % 2 {
        0 => Bit::Zero,
        _ => Bit::One,
    }
}

/// Returns bit corresponding to given index.
fn bit_from_index(bit_index: usize) -> Bit {
    match bit_index {
        0 => Bit::Zero,
        _ => Bit::One,
    }
}

/// Returns Hamming distance between received bits and output bits for given state transition.
fn branch_metric(
    received_bits: &[Bit],
    state_machine: &StateMachine,
    prev_state: State,
    state: State,
) -> usize {
    let input_bit = state_machine.input_bit_into(state);
    utils::error_count(
        received_bits,
        state_machine.output_bits(prev_state, input_bit),
    )
}

/// Generates code bits from encoder.
///
/// # Parameters
///
/// - `message_bits`: Message bits to be encoded.
///
/// - `state_machine`: State machine for the encoder.
///
/// - `code_bits`: Vector to which code bits from the encoder must be written (any pre-existing
///   elements will be cleared first). The number of code bits generated by the encoder is
///   `(message_bits.len() + state_machine.memory_len) * state_machine.num_output_bits`.
pub(crate) fn encode(
    message_bits: &[Bit],
    state_machine: &StateMachine,
    code_bits: &mut Vec<Bit>,
) {
    code_bits.clear();
    let mut state = State(0);
    let tail_bits = std::iter::repeat(Bit::Zero).take(state_machine.memory_len);
    for input_bit in message_bits.iter().copied().chain(tail_bits) {
        code_bits.extend_from_slice(state_machine.output_bits(state, input_bit));
        state = state_machine.next_state(state, input_bit);
    }
}

/// Returns message bit decisions from Viterbi decoder.
///
/// # Parameters
///
/// - `received_bits`: Received code bits, possibly corrupted. They are processed in groups of
///   `state_machine.num_output_bits`, and an incomplete last group is padded with `Zero` bits.
///
/// - `state_machine`: State machine for the decoder.
///
/// # Returns
///
/// - `message_bits_hat`: Decisions on the message bits. There is one decision per group of
///   received bits, minus `state_machine.memory_len` for the tail bits (no decisions at all if
///   there are fewer groups than that).
pub(crate) fn decode(received_bits: &[Bit], state_machine: &StateMachine) -> Vec<Bit> {
    let num_columns = received_bits.len().div_ceil(state_machine.num_output_bits);
    let mut workspace = DecoderWorkspace::new(state_machine, num_columns);
    for (time, chunk) in received_bits
        .chunks(state_machine.num_output_bits)
        .enumerate()
    {
        workspace.load_received_bits(chunk);
        compute_next_path_metrics(time, state_machine, &mut workspace);
    }
    run_traceback(state_machine, &workspace)
}

/// Computes path metrics for all states at next time instant, and records survivor decisions.
fn compute_next_path_metrics(
    time: usize,
    state_machine: &StateMachine,
    workspace: &mut DecoderWorkspace,
) {
    let pm_calc = &mut workspace.pm_calc;
    let column = workspace.trellis.column_mut(time);
    for (state_index, prev_state) in column.iter_mut().enumerate() {
        let state = State(state_index);
        let (prev_state1, prev_state2) = state_machine.previous_states(state);
        let metric1 = pm_calc.candidate_metric(
            &workspace.received_bits,
            state_machine,
            prev_state1,
            state,
        );
        let metric2 = pm_calc.candidate_metric(
            &workspace.received_bits,
            state_machine,
            prev_state2,
            state,
        );
        // Ties go to the first previous state
        let (metric, survivor) = if metric1 <= metric2 {
            (metric1, prev_state1)
        } else {
            (metric2, prev_state2)
        };
        pm_calc.path_metrics_next[state_index] = metric;
        *prev_state = survivor;
    }
    pm_calc.update_path_metrics();
}

/// Returns state with the smallest path metric (the lowest-indexed one among equals).
fn best_final_state(path_metrics: &[usize]) -> State {
    State(
        path_metrics
            .iter()
            .enumerate()
            .min_by_key(|&(_, &metric)| metric)
            .map_or(0, |(state_index, _)| state_index),
    )
}

/// Runs traceback through the trellis, and returns decisions on the message bits.
fn run_traceback(state_machine: &StateMachine, workspace: &DecoderWorkspace) -> Vec<Bit> {
    let trellis = &workspace.trellis;
    let mut state = best_final_state(&workspace.pm_calc.path_metrics);
    tracing::trace!(
        num_columns = trellis.num_columns(),
        best_path_metric = workspace.pm_calc.path_metrics[state.0],
        "running traceback"
    );
    let mut bits_hat = Vec::with_capacity(trellis.num_columns());
    for column in trellis.prev_states.rchunks_exact(trellis.num_states) {
        bits_hat.push(state_machine.input_bit_into(state));
        state = column[state.0];
    }
    bits_hat.reverse();
    bits_hat.truncate(bits_hat.len().saturating_sub(state_machine.memory_len));
    bits_hat
}
