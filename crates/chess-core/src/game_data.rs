use serde::{Deserialize, Serialize};

/// Header tags of a game, in the order they appeared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameHeaders {
    tags: Vec<(String, String)>,
}

impl GameHeaders {
    /// Later duplicates replace the earlier value but keep its position.
    pub fn insert(&mut self, key: &str, value: &str) {
        match self.tags.iter_mut().find(|(k, _)| k == key) {
            Some(tag) => tag.1 = value.to_string(),
            None => self.tags.push((key.to_string(), value.to_string())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tags.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn white(&self) -> &str {
        self.get("White").unwrap_or("?")
    }

    pub fn black(&self) -> &str {
        self.get("Black").unwrap_or("?")
    }

    pub fn result(&self) -> &str {
        self.get("Result").unwrap_or("*")
    }
}
