use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// A record that can be stored in a document collection.
///
/// Implementors serialize their identifier under [`Entity::ID_FIELD`],
/// normally with `#[serde(rename = "_id", with = "uuid_as_string")]`.
/// An entity whose identifier is the nil UUID has never been given an
/// identity and is rejected by `create` and `update`.
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Document field holding the identifier.
    const ID_FIELD: &'static str = "_id";

    fn id(&self) -> Uuid;

    fn set_id(&mut self, id: Uuid);

    fn has_identity(&self) -> bool {
        !self.id().is_nil()
    }
}

/// Serde adapter persisting a [`Uuid`] in its hyphenated string form, so
/// identifier equality filters can compare plain strings.
pub mod uuid_as_string {
    use serde::{Deserialize, Deserializer, Serializer};
    use uuid::Uuid;

    pub fn serialize<S>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&id.hyphenated().to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Uuid, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(serde::de::Error::custom)
    }
}
