pub mod groups;

pub use groups::Entity as Groups;
pub use groups::Model as GroupRow;
