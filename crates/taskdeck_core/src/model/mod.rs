mod task;
mod user;

pub use task::{Task, TaskListRecord, TaskRecord};
pub use user::User;

use serde::{Deserialize, Deserializer};

/// Backend ids arrive as JSON numbers in some responses and as strings in
/// others; both normalize to the string form used everywhere client-side.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(value) => value.to_string(),
        RawId::Text(value) => value,
    })
}
