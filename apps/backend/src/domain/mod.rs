//! Domain layer: the match record and the pure round logic that drives it.

pub mod dealing;
pub mod player_view;
pub mod rng;
pub mod round_machine;
pub mod rules;
pub mod scoring;
pub mod seed_derivation;
pub mod state;

#[cfg(test)]
mod tests_dealing;
#[cfg(test)]
mod tests_round_machine;

pub use round_machine::{MatchSetup, PlayerAction, RoundMachine};
pub use rules::TimerConfig;
pub use state::{CardId, LastRound, Match, Phase, PlayerId};
