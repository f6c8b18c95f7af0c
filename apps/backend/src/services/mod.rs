pub mod groups;

pub use groups::GroupService;
