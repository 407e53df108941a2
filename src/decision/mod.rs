//! Behavioral state machine
//!
//! Modes form a graph whose edges carry pure scoring functions. A throttled
//! re-evaluation moves the agent along the best edge that beats the stay
//! score, then the mode's menu picks a concrete action.

pub mod actions;
pub mod engine;
pub mod mode;
pub mod scoring;

pub use actions::{choose_action, pick_target, squad_centroid, Target};
pub use engine::{decide, decision_interval, select_mode};
pub use mode::{transitions, Mode, ScoreFn};
