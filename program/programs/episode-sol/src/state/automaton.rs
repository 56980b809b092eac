use anchor_lang::prelude::*;

use crate::errors::EpisodeError;
use crate::state::labels::{Hash, ZERO_HASH};

pub const MAX_STATES: usize = 16;
pub const MAX_SYMBOLS: usize = 16;
pub const MAX_EDGES: usize = 48;

/// A registered state. Index in `Automaton::states` is its arena handle.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, PartialEq, Eq, InitSpace)]
pub struct StateNode {
    pub id: [u8; 32],
    pub accepting: bool,
}

/// One `(from, symbol) -> to` entry, all fields being arena handles.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, InitSpace)]
pub struct Edge {
    pub from: u8,
    pub symbol: u8,
    pub to: u8,
}

/// Result of a successful transition, expressed in hashes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    pub from: Hash,
    pub to: Hash,
}

/// Deterministic finite automaton over opaque 32-byte state and symbol ids.
///
/// States and symbols live in small arenas and edges refer to them by index,
/// so the transition table stays sparse and hashes are only compared at the
/// boundary. Each `(from, symbol)` pair maps to at most one successor.
///
/// Symbols enter the alphabet when the first transition using them is added
/// and stay there after the transition is removed.
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Debug, Default, PartialEq, Eq, InitSpace)]
pub struct Automaton {
    #[max_len(16)]
    pub states: Vec<StateNode>,
    #[max_len(16)]
    pub alphabet: Vec<[u8; 32]>,
    #[max_len(48)]
    pub edges: Vec<Edge>,
    pub initial: u8,
    pub current: u8,
}

impl Automaton {
    /// Create an automaton whose only state is `initial`, which is also current.
    pub fn new(initial: Hash) -> Result<Self> {
        require!(initial != ZERO_HASH, EpisodeError::InvalidState);
        Ok(Self {
            states: vec![StateNode {
                id: initial,
                accepting: false,
            }],
            alphabet: Vec::new(),
            edges: Vec::new(),
            initial: 0,
            current: 0,
        })
    }

    pub fn state_index(&self, id: &Hash) -> Option<u8> {
        self.states
            .iter()
            .position(|node| node.id == *id)
            .map(|i| i as u8)
    }

    pub fn symbol_index(&self, symbol: &Hash) -> Option<u8> {
        self.alphabet
            .iter()
            .position(|s| s == symbol)
            .map(|i| i as u8)
    }

    pub fn contains(&self, id: &Hash) -> bool {
        self.state_index(id).is_some()
    }

    pub fn knows_symbol(&self, symbol: &Hash) -> bool {
        self.symbol_index(symbol).is_some()
    }

    /// Register `id` as a state. Registering an existing state returns its
    /// current handle and leaves edges untouched.
    pub fn create_state(&mut self, id: Hash) -> Result<u8> {
        require!(id != ZERO_HASH, EpisodeError::InvalidState);
        if let Some(index) = self.state_index(&id) {
            return Ok(index);
        }
        require!(self.states.len() < MAX_STATES, EpisodeError::CapacityExceeded);
        self.states.push(StateNode {
            id,
            accepting: false,
        });
        Ok((self.states.len() - 1) as u8)
    }

    /// Drop a non-initial state together with every edge touching it.
    pub fn remove_state(&mut self, id: &Hash) -> Result<()> {
        let index = self.state_index(id).ok_or(EpisodeError::InvalidState)?;
        require!(index != self.initial, EpisodeError::InitialChapterRemoval);
        require!(index != self.current, EpisodeError::UpdatesForbidden);

        self.states.remove(index as usize);
        self.edges.retain(|e| e.from != index && e.to != index);
        let shift = |i: u8| if i > index { i - 1 } else { i };
        for edge in self.edges.iter_mut() {
            edge.from = shift(edge.from);
            edge.to = shift(edge.to);
        }
        self.initial = shift(self.initial);
        self.current = shift(self.current);
        Ok(())
    }

    pub fn add_transition(&mut self, from: &Hash, to: &Hash, symbol: Hash) -> Result<()> {
        require!(*from != ZERO_HASH && *to != ZERO_HASH, EpisodeError::InvalidState);
        require!(symbol != ZERO_HASH, EpisodeError::InvalidSymbol);
        let from = self.state_index(from).ok_or(EpisodeError::InvalidState)?;
        let to = self.state_index(to).ok_or(EpisodeError::InvalidState)?;

        let symbol = match self.symbol_index(&symbol) {
            Some(index) => {
                require!(
                    self.edge(from, index).is_none(),
                    EpisodeError::DuplicateTransition
                );
                index
            }
            None => {
                require!(self.alphabet.len() < MAX_SYMBOLS, EpisodeError::CapacityExceeded);
                self.alphabet.push(symbol);
                (self.alphabet.len() - 1) as u8
            }
        };
        require!(self.edges.len() < MAX_EDGES, EpisodeError::CapacityExceeded);
        self.edges.push(Edge { from, symbol, to });
        Ok(())
    }

    pub fn remove_transition(&mut self, from: &Hash, symbol: &Hash) -> Result<()> {
        let position = self
            .state_index(from)
            .zip(self.symbol_index(symbol))
            .and_then(|(from, symbol)| {
                self.edges
                    .iter()
                    .position(|e| e.from == from && e.symbol == symbol)
            })
            .ok_or(EpisodeError::NoSuchTransition)?;
        self.edges.remove(position);
        Ok(())
    }

    fn edge(&self, from: u8, symbol: u8) -> Option<&Edge> {
        self.edges
            .iter()
            .find(|e| e.from == from && e.symbol == symbol)
    }

    /// Successor of `from` on `symbol`, if such an edge exists.
    pub fn destination(&self, from: &Hash, symbol: &Hash) -> Option<Hash> {
        let from = self.state_index(from)?;
        let symbol = self.symbol_index(symbol)?;
        self.edge(from, symbol)
            .map(|e| self.states[e.to as usize].id)
    }

    /// Feed `symbol` to the automaton.
    ///
    /// A symbol outside the alphabet is an error. A known symbol without an
    /// edge from the current state leaves the automaton where it is and
    /// returns `Ok(None)`.
    pub fn transition(&mut self, symbol: &Hash) -> Result<Option<Step>> {
        let symbol = self
            .symbol_index(symbol)
            .ok_or(EpisodeError::EventNonExistent)?;
        let Some(edge) = self.edge(self.current, symbol).copied() else {
            return Ok(None);
        };
        let from = self.states[edge.from as usize].id;
        self.current = edge.to;
        Ok(Some(Step {
            from,
            to: self.states[edge.to as usize].id,
        }))
    }

    pub fn set_accepting(&mut self, id: &Hash, accepting: bool) -> Result<()> {
        let index = self.state_index(id).ok_or(EpisodeError::InvalidState)?;
        self.states[index as usize].accepting = accepting;
        Ok(())
    }

    pub fn is_accepting(&self, id: &Hash) -> bool {
        self.states.iter().any(|node| node.id == *id && node.accepting)
    }

    pub fn is_final(&self) -> bool {
        self.states[self.current as usize].accepting
    }

    pub fn current(&self) -> &Hash {
        &self.states[self.current as usize].id
    }

    pub fn initial(&self) -> &Hash {
        &self.states[self.initial as usize].id
    }

    pub fn in_initial_state(&self) -> bool {
        self.current == self.initial
    }

    /// Rewind to the initial state. Never used by instructions.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::labels::hash_label;

    fn assert_error<T>(result: Result<T>, expected: EpisodeError) {
        match result {
            Ok(_) => panic!("expected {expected:?}"),
            Err(err) => assert_eq!(err, anchor_lang::error::Error::from(expected)),
        }
    }

    fn h(label: &str) -> Hash {
        hash_label(label)
    }

    fn three_states() -> Automaton {
        let mut dfa = Automaton::new(h("A")).unwrap();
        dfa.create_state(h("B")).unwrap();
        dfa.create_state(h("C")).unwrap();
        dfa
    }

    #[test]
    fn zero_initial_state_is_rejected() {
        assert_error(Automaton::new(ZERO_HASH), EpisodeError::InvalidState);
    }

    #[test]
    fn create_state_is_idempotent() {
        let mut dfa = three_states();
        assert_eq!(dfa.create_state(h("B")).unwrap(), 1);
        assert_eq!(dfa.states.len(), 3);
        assert_error(dfa.create_state(ZERO_HASH), EpisodeError::InvalidState);
    }

    #[test]
    fn transitions_are_deterministic() {
        let mut dfa = three_states();
        dfa.add_transition(&h("A"), &h("B"), h("go")).unwrap();
        assert_error(
            dfa.add_transition(&h("A"), &h("C"), h("go")),
            EpisodeError::DuplicateTransition,
        );
        dfa.add_transition(&h("B"), &h("C"), h("go")).unwrap();

        for _ in 0..3 {
            assert_eq!(dfa.destination(&h("A"), &h("go")), Some(h("B")));
        }
        let step = dfa.transition(&h("go")).unwrap().unwrap();
        assert_eq!(step, Step { from: h("A"), to: h("B") });
        assert_eq!(dfa.current(), &h("B"));
        dfa.transition(&h("go")).unwrap();
        assert_eq!(dfa.current(), &h("C"));
    }

    #[test]
    fn invalid_endpoints_are_rejected() {
        let mut dfa = three_states();
        assert_error(
            dfa.add_transition(&ZERO_HASH, &h("B"), h("go")),
            EpisodeError::InvalidState,
        );
        assert_error(
            dfa.add_transition(&h("A"), &h("Z"), h("go")),
            EpisodeError::InvalidState,
        );
        assert_error(
            dfa.add_transition(&h("A"), &h("B"), ZERO_HASH),
            EpisodeError::InvalidSymbol,
        );
    }

    #[test]
    fn unknown_symbol_fails_but_unmapped_symbol_is_noop() {
        let mut dfa = three_states();
        dfa.add_transition(&h("B"), &h("C"), h("later")).unwrap();

        assert_error(dfa.transition(&h("never")), EpisodeError::EventNonExistent);
        assert_eq!(dfa.transition(&h("later")).unwrap(), None);
        assert_eq!(dfa.current(), &h("A"));
    }

    #[test]
    fn remove_transition() {
        let mut dfa = three_states();
        dfa.add_transition(&h("A"), &h("B"), h("go")).unwrap();
        dfa.remove_transition(&h("A"), &h("go")).unwrap();
        assert_eq!(dfa.destination(&h("A"), &h("go")), None);
        assert!(dfa.knows_symbol(&h("go")));
        assert_error(
            dfa.remove_transition(&h("A"), &h("go")),
            EpisodeError::NoSuchTransition,
        );
        dfa.add_transition(&h("A"), &h("C"), h("go")).unwrap();
        assert_eq!(dfa.destination(&h("A"), &h("go")), Some(h("C")));
    }

    #[test]
    fn remove_state_renumbers_edges() {
        let mut dfa = three_states();
        dfa.add_transition(&h("A"), &h("B"), h("x")).unwrap();
        dfa.add_transition(&h("A"), &h("C"), h("y")).unwrap();
        dfa.add_transition(&h("B"), &h("C"), h("y")).unwrap();

        dfa.remove_state(&h("B")).unwrap();
        assert!(!dfa.contains(&h("B")));
        assert_eq!(dfa.edges.len(), 1);
        assert_eq!(dfa.destination(&h("A"), &h("y")), Some(h("C")));
        assert_eq!(dfa.destination(&h("A"), &h("x")), None);

        assert_error(dfa.remove_state(&h("A")), EpisodeError::InitialChapterRemoval);
        assert_error(dfa.remove_state(&h("B")), EpisodeError::InvalidState);
    }

    #[test]
    fn accepting_states_and_reset() {
        let mut dfa = three_states();
        dfa.set_accepting(&h("C"), true).unwrap();
        dfa.add_transition(&h("A"), &h("C"), h("end")).unwrap();
        assert!(dfa.is_accepting(&h("C")));
        assert!(!dfa.is_final());

        dfa.transition(&h("end")).unwrap();
        assert!(dfa.is_final());
        assert!(!dfa.in_initial_state());

        dfa.reset();
        assert_eq!(dfa.current(), &h("A"));
        assert!(dfa.in_initial_state());
    }

    #[test]
    fn capacity_is_bounded() {
        let mut dfa = Automaton::new(h("s0")).unwrap();
        for i in 1..MAX_STATES {
            dfa.create_state(h(&format!("s{i}"))).unwrap();
        }
        assert_error(dfa.create_state(h("overflow")), EpisodeError::CapacityExceeded);
    }
}
