use serde::{Deserialize, Deserializer, Serialize};

/// Title served in place of a meme while the cache holds nothing.
pub const UNAVAILABLE_TITLE: &str = "No memes available";

/// A single meme served to clients. Only ever built by parsing the upstream
/// listing (or as the `unavailable` sentinel).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub url: String,
}

/// Upstream posts may carry `null` for either field; treat it like a missing one.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Item {
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
        }
    }

    /// The sentinel returned by an empty cache.
    pub fn unavailable() -> Self {
        Self::new(UNAVAILABLE_TITLE, "")
    }

    pub fn is_unavailable(&self) -> bool {
        *self == Self::unavailable()
    }
}
