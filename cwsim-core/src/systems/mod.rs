//! Turn-resolution systems: each runs over the whole state in a
//! deterministic order.

pub mod combat;
pub mod economy;
pub mod events;
pub mod logistics;
pub mod movement;
pub mod naval;
pub mod victory;

pub use events::run_events_tick;
pub use logistics::{run_supply_tick, train_capacity};
pub use victory::VictoryReason;
