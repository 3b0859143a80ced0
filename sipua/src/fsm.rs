//! A generic, table-driven finite-state-machine engine.
//!
//! A [`Table`] is a fixed set of [`State`]s, each mapping an `Input` to the
//! index of its successor state plus an [`Action`] to run on the
//! transition. [`Fsm`] pairs a shared `Table` with one instance's current
//! state index; [`Fsm::spin`] is the only way to move it. An `Action` may
//! return a follow-up input, which is fed back into the same `spin` call so
//! that composite transitions (e.g. "send an ACK, then delete") are
//! expressed declaratively rather than as a chain of calls from outside.
//!
//! The engine itself performs no I/O: an `Action` only mutates its
//! `Context` (typically by queuing up effects the caller executes
//! afterwards). This keeps the table a pure description of the transaction
//! state machines in RFC 3261 §17, testable without a transport or a clock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Mutex;

use crate::error::{Error, Result};

/// A transition action: given the context, performs whatever side effect
/// the transition calls for and optionally returns a follow-up input to
/// feed back into the machine immediately.
pub type Action<C, I> = fn(&mut C) -> Option<I>;

/// One state in a [`Table`]: a name (used in error messages and logging)
/// and the outcomes defined for it.
pub struct State<C, I> {
    name: &'static str,
    outcomes: HashMap<I, (usize, Action<C, I>)>,
}

impl<C, I: Eq + Hash> State<C, I> {
    /// Creates a state with no outcomes yet.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            outcomes: HashMap::new(),
        }
    }

    /// Adds an outcome: on `input`, transition to the state at `next` and
    /// run `action`.
    pub fn on(mut self, input: I, next: usize, action: Action<C, I>) -> Self {
        self.outcomes.insert(input, (next, action));
        self
    }
}

/// A validated, immutable set of states. Cheap to share (e.g. behind an
/// `Arc`) across every transaction instance of a given kind, since the
/// table itself holds no per-instance state.
pub struct Table<C, I> {
    states: Vec<State<C, I>>,
}

impl<C, I: Eq + Hash> Table<C, I> {
    /// Builds a table from `states`, failing if any outcome names a
    /// successor index that doesn't exist.
    pub fn define(states: Vec<State<C, I>>) -> Result<Self> {
        for state in &states {
            for (next, _) in state.outcomes.values() {
                if *next >= states.len() {
                    return Err(Error::FsmDefine(state.name));
                }
            }
        }
        Ok(Self { states })
    }

    /// The name of the state at `index`.
    pub fn name(&self, index: usize) -> &'static str {
        self.states[index].name
    }
}

/// One running instance of a [`Table`]: the current state index, protected
/// by a mutex so that concurrent `spin` calls on the same instance are
/// serialized, matching the engine's single-threaded-per-instance contract.
pub struct Fsm<C, I> {
    table: std::sync::Arc<Table<C, I>>,
    current: Mutex<usize>,
}

impl<C, I: Eq + Hash + Copy> Fsm<C, I> {
    /// Creates a new instance of `table`, starting at state `start`.
    pub fn new(table: std::sync::Arc<Table<C, I>>, start: usize) -> Self {
        Self {
            table,
            current: Mutex::new(start),
        }
    }

    /// The current state's index.
    pub fn state_index(&self) -> usize {
        *self.current.lock().expect("fsm lock poisoned")
    }

    /// The current state's name.
    pub fn state_name(&self) -> &'static str {
        self.table.name(self.state_index())
    }

    /// Feeds `input` into the machine: looks up the outcome for the
    /// current state, transitions, and runs the action. If the action
    /// returns a follow-up input, it is spun immediately, before this call
    /// returns, so the whole chain completes atomically with respect to
    /// other callers.
    pub fn spin(&self, ctx: &mut C, input: I) -> Result<()> {
        let mut guard = self.current.lock().expect("fsm lock poisoned");
        let mut next_input = Some(input);
        while let Some(input) = next_input.take() {
            let state = &self.table.states[*guard];
            let (next, action) = state
                .outcomes
                .get(&input)
                .ok_or(Error::FsmNoTransition { state: state.name })?;
            *guard = *next;
            next_input = action(ctx);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter(u32);

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Toggle {
        Flip,
        FlipAndChain,
    }

    fn bump(ctx: &mut Counter) -> Option<Toggle> {
        ctx.0 += 1;
        None
    }

    fn bump_and_chain(ctx: &mut Counter) -> Option<Toggle> {
        ctx.0 += 1;
        Some(Toggle::Flip)
    }

    #[test]
    fn chained_action_feeds_back_into_same_spin() {
        let table = Table::define(vec![
            State::new("off").on(Toggle::Flip, 1, bump).on(Toggle::FlipAndChain, 1, bump_and_chain),
            State::new("on").on(Toggle::Flip, 0, bump).on(Toggle::FlipAndChain, 0, bump_and_chain),
        ])
        .unwrap();
        let fsm = Fsm::new(std::sync::Arc::new(table), 0);
        let mut ctx = Counter::default();

        fsm.spin(&mut ctx, Toggle::FlipAndChain).unwrap();

        assert_eq!(ctx.0, 2);
        assert_eq!(fsm.state_name(), "on");
    }

    #[test]
    fn missing_outcome_errors_without_transitioning() {
        let table = Table::define(vec![State::new("off").on(Toggle::Flip, 0, bump)]).unwrap();
        let fsm = Fsm::new(std::sync::Arc::new(table), 0);
        let mut ctx = Counter::default();

        let err = fsm.spin(&mut ctx, Toggle::FlipAndChain).unwrap_err();
        assert!(matches!(err, Error::FsmNoTransition { state: "off" }));
    }

    #[test]
    fn define_rejects_out_of_range_successor() {
        let err = Table::<Counter, Toggle>::define(vec![State::new("off").on(Toggle::Flip, 5, bump)]).unwrap_err();
        assert!(matches!(err, Error::FsmDefine("off")));
    }
}
