use serde::{Deserialize, Serialize};

/// Profile of the account that owns the session.
///
/// The register endpoint emits the id as a JSON number while everything else
/// uses strings; deserialization accepts both and keeps the string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "super::deserialize_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl User {
    /// Display name, falling back to the email address.
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }
}
