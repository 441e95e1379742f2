// Automaton Model
//
// Immutable DFA with a flat (state, symbol) transition table resolved at
// construction time. Partial tables are allowed: an empty slot means the
// automaton has no move for that pair.

use crate::definition::{AutomatonDefinition, TransitionDef};
use crate::{AutomatonConfig, AutomatonError, AutomatonResult};
use ahash::AHashMap;
use std::collections::VecDeque;
use std::fmt;
use tracing::{debug, warn};

/// Dense state index assigned at construction time
pub type StateId = usize;

/// An immutable deterministic finite automaton
#[derive(Clone)]
pub struct Automaton {
    /// State names, indexed by StateId
    states: Vec<String>,

    /// Name -> StateId
    state_index: AHashMap<String, StateId>,

    /// Alphabet in declaration order
    alphabet: Vec<char>,

    /// Symbol -> column in the transition table
    symbol_index: AHashMap<char, usize>,

    /// Row-major table: table[state * alphabet.len() + symbol]
    table: Vec<Option<StateId>>,

    /// Initial state
    start: StateId,

    /// Accepting flag per state
    accepting: Vec<bool>,

    /// Number of defined (non-empty) table slots
    transition_count: usize,
}

impl Automaton {
    /// Start building an automaton with default limits
    pub fn builder() -> AutomatonBuilder {
        AutomatonBuilder::new()
    }

    /// Look up the move for (state, symbol)
    ///
    /// Returns `None` when the symbol is outside the alphabet or the table
    /// has no entry for the pair.
    pub fn transition(&self, state: StateId, symbol: char) -> Option<StateId> {
        let column = self.symbol_index(symbol)?;
        self.transition_by_index(state, column)
    }

    /// Look up the move for (state, symbol column)
    pub fn transition_by_index(&self, state: StateId, column: usize) -> Option<StateId> {
        let width = self.alphabet.len();
        if state >= self.states.len() || column >= width {
            return None;
        }
        self.table[state * width + column]
    }

    /// Column of a symbol in the transition table
    pub fn symbol_index(&self, symbol: char) -> Option<usize> {
        self.symbol_index.get(&symbol).copied()
    }

    pub fn is_accepting(&self, state: StateId) -> bool {
        self.accepting.get(state).copied().unwrap_or(false)
    }

    pub fn alphabet_contains(&self, symbol: char) -> bool {
        self.symbol_index.contains_key(&symbol)
    }

    pub fn start_state(&self) -> StateId {
        self.start
    }

    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    pub fn state_id(&self, name: &str) -> Option<StateId> {
        self.state_index.get(name).copied()
    }

    pub fn state_name(&self, id: StateId) -> Option<&str> {
        self.states.get(id).map(String::as_str)
    }

    /// State names in StateId order
    pub fn states(&self) -> impl Iterator<Item = &str> {
        self.states.iter().map(String::as_str)
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn accepting_states(&self) -> impl Iterator<Item = StateId> + '_ {
        self.accepting
            .iter()
            .enumerate()
            .filter(|(_, accepting)| **accepting)
            .map(|(id, _)| id)
    }

    pub fn transition_count(&self) -> usize {
        self.transition_count
    }

    /// True if every (state, symbol) pair has a move
    pub fn is_total(&self) -> bool {
        self.transition_count == self.table.len()
    }

    /// States reachable from the start state
    pub fn reachable_states(&self) -> Vec<bool> {
        let width = self.alphabet.len();
        let mut seen = vec![false; self.states.len()];
        let mut queue = VecDeque::new();
        seen[self.start] = true;
        queue.push_back(self.start);

        while let Some(state) = queue.pop_front() {
            let row = &self.table[state * width..(state + 1) * width];
            for next in row.iter().flatten() {
                if !seen[*next] {
                    seen[*next] = true;
                    queue.push_back(*next);
                }
            }
        }

        seen
    }

    /// Convert back into a serializable definition
    pub fn to_definition(&self) -> AutomatonDefinition {
        let width = self.alphabet.len();
        let mut transitions = Vec::with_capacity(self.transition_count);
        for (state, name) in self.states.iter().enumerate() {
            for (column, symbol) in self.alphabet.iter().enumerate() {
                if let Some(next) = self.table[state * width + column] {
                    transitions.push(TransitionDef {
                        from: name.clone(),
                        symbol: *symbol,
                        to: self.states[next].clone(),
                    });
                }
            }
        }

        AutomatonDefinition {
            states: self.states.clone(),
            alphabet: self.alphabet.clone(),
            transitions,
            start_state: self.states[self.start].clone(),
            accept_states: self
                .accepting_states()
                .map(|id| self.states[id].clone())
                .collect(),
        }
    }
}

impl fmt::Debug for Automaton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Automaton")
            .field("state_count", &self.states.len())
            .field("alphabet_len", &self.alphabet.len())
            .field("transition_count", &self.transition_count)
            .field("start", &self.states[self.start])
            .finish()
    }
}

/// Builder for constructing an Automaton
///
/// States and symbols have set semantics: adding one twice is a no-op.
/// All structural validation happens in [`AutomatonBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct AutomatonBuilder {
    states: Vec<String>,
    state_index: AHashMap<String, StateId>,
    alphabet: Vec<char>,
    symbol_index: AHashMap<char, usize>,
    transitions: Vec<(String, char, String)>,
    start: Option<String>,
    accepting: Vec<String>,
    config: AutomatonConfig,
}

impl AutomatonBuilder {
    /// Create a new builder with default limits
    pub fn new() -> Self {
        Self::with_config(AutomatonConfig::default())
    }

    /// Create a new builder with custom limits
    pub fn with_config(config: AutomatonConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Declare a state
    pub fn state(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.state_index.contains_key(&name) {
            self.state_index.insert(name.clone(), self.states.len());
            self.states.push(name);
        }
        self
    }

    /// Declare several states
    pub fn states<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self = self.state(name);
        }
        self
    }

    /// Add a symbol to the alphabet
    pub fn symbol(mut self, symbol: char) -> Self {
        if !self.symbol_index.contains_key(&symbol) {
            self.symbol_index.insert(symbol, self.alphabet.len());
            self.alphabet.push(symbol);
        }
        self
    }

    /// Add several symbols to the alphabet
    pub fn symbols(mut self, symbols: impl IntoIterator<Item = char>) -> Self {
        for symbol in symbols {
            self = self.symbol(symbol);
        }
        self
    }

    /// Add a single transition
    pub fn transition(
        mut self,
        from: impl Into<String>,
        symbol: char,
        to: impl Into<String>,
    ) -> Self {
        self.transitions.push((from.into(), symbol, to.into()));
        self
    }

    /// Add the same move for every symbol in `symbols`
    pub fn transitions_on(
        mut self,
        from: &str,
        symbols: impl IntoIterator<Item = char>,
        to: &str,
    ) -> Self {
        for symbol in symbols {
            self.transitions
                .push((from.to_string(), symbol, to.to_string()));
        }
        self
    }

    /// Set the start state
    pub fn start(mut self, name: impl Into<String>) -> Self {
        self.start = Some(name.into());
        self
    }

    /// Mark a state as accepting
    pub fn accepting(mut self, name: impl Into<String>) -> Self {
        self.accepting.push(name.into());
        self
    }

    /// Mark several states as accepting
    pub fn accepting_states<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepting.extend(names.into_iter().map(Into::into));
        self
    }

    /// Validate and build the automaton
    pub fn build(self) -> AutomatonResult<Automaton> {
        let config = &self.config;
        if config.max_states > 0 && self.states.len() > config.max_states {
            return Err(AutomatonError::StateLimitExceeded {
                states: self.states.len(),
                max: config.max_states,
            });
        }
        if config.max_alphabet > 0 && self.alphabet.len() > config.max_alphabet {
            return Err(AutomatonError::AlphabetLimitExceeded {
                symbols: self.alphabet.len(),
                max: config.max_alphabet,
            });
        }

        let start_name = self
            .start
            .as_deref()
            .ok_or_else(|| AutomatonError::invalid("no start state given"))?;
        let start = *self.state_index.get(start_name).ok_or_else(|| {
            AutomatonError::invalid(format!("start state '{}' is not declared", start_name))
        })?;

        let mut accepting = vec![false; self.states.len()];
        for name in &self.accepting {
            let id = self.state_index.get(name).ok_or_else(|| {
                AutomatonError::invalid(format!("accepting state '{}' is not declared", name))
            })?;
            accepting[*id] = true;
        }

        let width = self.alphabet.len();
        let mut table = vec![None; self.states.len() * width];
        let mut transition_count = 0;

        for (from, symbol, to) in &self.transitions {
            let from_id = *self.state_index.get(from).ok_or_else(|| {
                AutomatonError::invalid(format!(
                    "transition ({}, {:?}) starts at undeclared state '{}'",
                    from, symbol, from
                ))
            })?;
            let to_id = *self.state_index.get(to).ok_or_else(|| {
                AutomatonError::invalid(format!(
                    "transition ({}, {:?}) targets undeclared state '{}'",
                    from, symbol, to
                ))
            })?;
            let column = *self.symbol_index.get(symbol).ok_or_else(|| {
                AutomatonError::invalid(format!(
                    "transition ({}, {:?}) uses a symbol outside the alphabet",
                    from, symbol
                ))
            })?;

            let slot = &mut table[from_id * width + column];
            match *slot {
                Some(existing) if existing != to_id => {
                    return Err(AutomatonError::invalid(format!(
                        "conflicting transitions for ({}, {:?}): '{}' and '{}'",
                        from, symbol, self.states[existing], to
                    )));
                }
                Some(_) => {}
                None => {
                    *slot = Some(to_id);
                    transition_count += 1;
                }
            }
        }

        let automaton = Automaton {
            states: self.states,
            state_index: self.state_index,
            alphabet: self.alphabet,
            symbol_index: self.symbol_index,
            table,
            start,
            accepting,
            transition_count,
        };

        let reachable = automaton.reachable_states();
        if automaton.accepting_states().next().is_some()
            && !automaton.accepting_states().any(|id| reachable[id])
        {
            warn!(
                start = %start_name_of(&automaton),
                "No accepting state is reachable from the start state"
            );
        }

        debug!(
            states = automaton.state_count(),
            alphabet = automaton.alphabet.len(),
            transitions = automaton.transition_count,
            total = automaton.is_total(),
            "Automaton built"
        );

        Ok(automaton)
    }
}

fn start_name_of(automaton: &Automaton) -> &str {
    automaton.states[automaton.start].as_str()
}
