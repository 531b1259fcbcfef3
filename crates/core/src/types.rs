use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// An entity that can be tested for segment membership.
///
/// The only requirement is a stable identity; storage and querying belong
/// to whoever supplies the member store.
pub trait Member: Clone + Send + Sync + 'static {
    type Id: Clone + Eq + Hash + Debug + Send + Sync + 'static;

    fn member_id(&self) -> Self::Id;
}

/// Stock member type: an identified bag of attributes plus recent events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub events: Vec<ProfileEvent>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileEvent {
    pub event_name: String,
    #[serde(default)]
    pub properties: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

impl Profile {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: HashMap::new(),
            events: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn with_event(mut self, event_name: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        self.events.push(ProfileEvent {
            event_name: event_name.into(),
            properties: HashMap::new(),
            timestamp,
        });
        self
    }
}

impl Member for Profile {
    type Id = String;

    fn member_id(&self) -> String {
        self.id.clone()
    }
}
