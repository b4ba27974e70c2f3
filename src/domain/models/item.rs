use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::{uuid_as_string, Entity};

/// A catalog entry, the entity the command line front end manages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "_id", with = "uuid_as_string")]
    id: Uuid,
    name: String,
    description: String,
    price: f64,
    created_at: i64,
}

impl Item {
    pub fn new(name: impl Into<String>, description: impl Into<String>, price: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: description.into(),
            price,
            created_at: current_timestamp(),
        }
    }

    /// Reconstitutes from persisted data.
    pub fn reconstitute(
        id: Uuid,
        name: String,
        description: String,
        price: f64,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            name,
            description,
            price,
            created_at,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn price(&self) -> f64 {
        self.price
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    pub fn set_price(&mut self, price: f64) {
        self.price = price;
    }

    pub fn display_line(&self) -> String {
        format!("{} ({}) - {:.2}", self.name, self.id, self.price)
    }
}

impl Entity for Item {
    fn id(&self) -> Uuid {
        self.id
    }

    fn set_id(&mut self, id: Uuid) {
        self.id = id;
    }
}

fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
