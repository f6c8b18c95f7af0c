pub mod group_id;
pub mod queue;
pub mod validated_json;

pub use group_id::GroupId;
pub use queue::QueueParam;
pub use validated_json::ValidatedJson;
