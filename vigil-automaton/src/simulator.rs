// Automaton Simulator
//
// Runs an Automaton over an input sequence and reports a verdict together
// with the step trace. Rejections are verdicts, never errors.

use crate::model::{Automaton, StateId};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::trace;

/// Outcome of a single run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    /// Input exhausted in an accepting state
    Accepted,

    /// Input exhausted in a non-accepting state
    RejectedFinalState,

    /// Halted early: no move defined for (state, symbol)
    RejectedNoTransition,

    /// Halted early: symbol outside the alphabet
    RejectedInvalidSymbol,
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// True if the run stopped before consuming all input
    pub fn halted_early(&self) -> bool {
        matches!(
            self,
            Verdict::RejectedNoTransition | Verdict::RejectedInvalidSymbol
        )
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Accepted => write!(f, "accepted"),
            Verdict::RejectedFinalState => write!(f, "rejected (final state not accepting)"),
            Verdict::RejectedNoTransition => write!(f, "rejected (no transition)"),
            Verdict::RejectedInvalidSymbol => write!(f, "rejected (symbol not in alphabet)"),
        }
    }
}

/// One consumed symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceStep {
    pub from: StateId,
    pub symbol: char,
    pub to: StateId,
}

/// Where a run stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Halt {
    /// Symbol position in the input (0-based)
    pub position: usize,

    /// The symbol that could not be consumed
    pub symbol: char,
}

/// Result of running an automaton over one input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub verdict: Verdict,

    /// Consumed steps, in order. Empty when trace recording is disabled.
    pub trace: Vec<TraceStep>,

    /// State the run ended in
    pub final_state: StateId,

    /// Number of symbols consumed
    pub consumed: usize,

    /// Set when the run halted before the end of input
    pub halted_on: Option<Halt>,
}

impl ExecutionResult {
    pub fn is_accepted(&self) -> bool {
        self.verdict.is_accepted()
    }

    /// State names visited, starting with the start state
    pub fn state_path<'a>(&self, automaton: &'a Automaton) -> Vec<&'a str> {
        let mut path = Vec::with_capacity(self.trace.len() + 1);
        let start = self
            .trace
            .first()
            .map(|step| step.from)
            .unwrap_or(self.final_state);
        path.extend(automaton.state_name(start));
        for step in &self.trace {
            path.extend(automaton.state_name(step.to));
        }
        path
    }
}

/// Simulator configuration
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Record one TraceStep per consumed symbol
    pub record_trace: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { record_trace: true }
    }
}

/// Deterministic DFA runner
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Simulator that skips trace recording
    pub fn without_trace() -> Self {
        Self::new(SimulatorConfig {
            record_trace: false,
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run over the characters of `input`
    pub fn run(&self, automaton: &Automaton, input: &str) -> ExecutionResult {
        self.run_symbols(automaton, input.chars())
    }

    /// Run over an arbitrary symbol stream
    pub fn run_symbols<I>(&self, automaton: &Automaton, symbols: I) -> ExecutionResult
    where
        I: IntoIterator<Item = char>,
    {
        let symbols = symbols.into_iter();
        let mut trace_steps = if self.config.record_trace {
            Vec::with_capacity(symbols.size_hint().0)
        } else {
            Vec::new()
        };
        let mut state = automaton.start_state();
        let mut consumed = 0;

        for (position, symbol) in symbols.enumerate() {
            let halt = Halt { position, symbol };

            let column = match automaton.symbol_index(symbol) {
                Some(column) => column,
                None => {
                    return ExecutionResult {
                        verdict: Verdict::RejectedInvalidSymbol,
                        trace: trace_steps,
                        final_state: state,
                        consumed,
                        halted_on: Some(halt),
                    };
                }
            };

            let next = match automaton.transition_by_index(state, column) {
                Some(next) => next,
                None => {
                    return ExecutionResult {
                        verdict: Verdict::RejectedNoTransition,
                        trace: trace_steps,
                        final_state: state,
                        consumed,
                        halted_on: Some(halt),
                    };
                }
            };

            trace!(from = state, symbol = %symbol.escape_debug(), to = next, "step");
            if self.config.record_trace {
                trace_steps.push(TraceStep {
                    from: state,
                    symbol,
                    to: next,
                });
            }
            state = next;
            consumed += 1;
        }

        let verdict = if automaton.is_accepting(state) {
            Verdict::Accepted
        } else {
            Verdict::RejectedFinalState
        };

        ExecutionResult {
            verdict,
            trace: trace_steps,
            final_state: state,
            consumed,
            halted_on: None,
        }
    }
}

/// Run with trace recording enabled
pub fn run(automaton: &Automaton, input: &str) -> ExecutionResult {
    Simulator::default().run(automaton, input)
}

/// True if `automaton` accepts `input`
pub fn accepts(automaton: &Automaton, input: &str) -> bool {
    Simulator::without_trace().run(automaton, input).is_accepted()
}
