//! ECS Systems - process entities each tick

pub mod apparel;
pub mod death;
pub mod tracking;

pub use death::{cleanup_dead, death_system};
pub use tracking::{ensure_trackers, remove_all_trackers};
