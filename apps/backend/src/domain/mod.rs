//! Domain layer: pure sign-up logic. No I/O, no clocks; callers pass `now`.

pub mod creation;
pub mod group;
pub mod projection;
pub mod roster;
pub mod signup;
pub mod timezone;

pub use creation::{parse_new_group, CreateGroupForm};
pub use group::{Entry, Group, NewGroup, QueueType};
pub use projection::{resolve_group, GroupView, PlayerView};
pub use roster::{resolve, Resolution};
