//! Store adapters behind the `GroupStore` gateway.

pub mod groups_memory;
pub mod groups_sea;

pub use groups_memory::MemoryGroupStore;
pub use groups_sea::SeaGroupStore;
