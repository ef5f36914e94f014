//! Battle kernel - two-faction tactical simulation on a tile grid
//!
//! Deliberately headless: the kernel never renders, sleeps or loads
//! files. An external driver calls `advance_tick` and reads state.
//!
//! Key shapes:
//! - Terrain is a cost field; pathfinding and cover both read it
//! - The spatial index allows stacking; movement rules keep living
//!   units apart
//! - Units are one record plus a stat template, not a type hierarchy
//! - Dead units leave the roster only in the end-of-tick sweep

mod behavior;
pub mod combat;
pub mod grid;
pub mod healing;
pub mod pathfinding;
pub mod scenario;
pub mod simulation;
pub mod terrain;
pub mod units;
pub mod weather;

// Re-exports for convenient access
pub use grid::SpatialIndex;
pub use healing::HealingZone;
pub use pathfinding::{find_path, PathResult};
pub use scenario::{DeployRect, RosterEntry, Scenario};
pub use simulation::{BattleSim, BattleStatus, UnitReport};
pub use terrain::{TerrainField, IMPASSABLE_COST};
pub use units::{roster, Faction, Unit, UnitClass, UnitState, UnitTemplate};
pub use weather::Weather;
