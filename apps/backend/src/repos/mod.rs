//! Repository layer: store gateway traits plus row decoding.

pub mod groups;

pub use groups::{GroupStore, GroupTxn};
