//! Zborow - tile-grid battle simulation kernel

pub mod battle;
pub mod core;

pub use battle::{BattleSim, BattleStatus, Scenario, Weather};
pub use core::config::BattleConfig;
pub use core::error::{BattleError, Result};
pub use core::types::{Cell, Tick, UnitId};
