//! Tracked cities - the bounded, ordered favourites list

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default number of cities a list may hold.
pub const MAX_CITIES: usize = 10;

/// A named location tracked for weather display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct City {
    pub id: u32,
    pub name: String,
    /// Display rank; lower sorts first
    pub sort: u32,
}

impl City {
    pub fn new(id: u32, name: impl Into<String>, sort: u32) -> Self {
        Self {
            id,
            name: name.into(),
            sort,
        }
    }
}

/// How ids are assigned to newly added cities
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// `id` is the list length at insertion time. Ids can repeat after a removal.
    #[default]
    Positional,
    /// `id` is one past the largest id in the list.
    Monotonic,
}

/// Reasons a city cannot be added
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum CityError {
    #[error("This city is not valid. Please try another one")]
    Invalid,
    #[error("This city already exists. Please try another one")]
    Duplicate,
    #[error("You can track up to {max} cities. Remove one to add another")]
    Full { max: usize },
}

/// Ordered list of cities with a capacity bound.
///
/// Entries are always kept in display order. Names are unique.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CityList {
    entries: Vec<City>,
    capacity: usize,
    ids: IdStrategy,
}

impl Default for CityList {
    fn default() -> Self {
        Self::new(MAX_CITIES, IdStrategy::default())
    }
}

impl CityList {
    pub fn new(capacity: usize, ids: IdStrategy) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            ids,
        }
    }

    /// Replace the entries, ordering them by `sort`. Ties keep their stored order.
    pub fn replace(&mut self, mut cities: Vec<City>) {
        cities.sort_by_key(|city| city.sort);
        self.entries = cities;
    }

    pub fn with_cities(mut self, cities: Vec<City>) -> Self {
        self.replace(cities);
        self
    }

    pub fn as_slice(&self) -> &[City] {
        &self.entries
    }

    pub fn to_vec(&self) -> Vec<City> {
        self.entries.clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn get(&self, index: usize) -> Option<&City> {
        self.entries.get(index)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|city| city.name == name)
    }

    /// Index of the first entry carrying `id`
    pub fn position(&self, id: u32) -> Option<usize> {
        self.entries.iter().position(|city| city.id == id)
    }

    /// Check whether `name` could be appended right now.
    pub fn check(&self, name: &str) -> Result<(), CityError> {
        if self.contains(name) {
            return Err(CityError::Duplicate);
        }
        if self.is_full() {
            return Err(CityError::Full { max: self.capacity });
        }
        Ok(())
    }

    fn next_id(&self) -> u32 {
        match self.ids {
            IdStrategy::Positional => self.entries.len() as u32,
            IdStrategy::Monotonic => self
                .entries
                .iter()
                .map(|city| city.id + 1)
                .max()
                .unwrap_or(0),
        }
    }

    /// Append a city. `sort` is the list length before insertion.
    pub fn push(&mut self, name: &str) -> Result<&City, CityError> {
        self.check(name)?;
        let city = City::new(self.next_id(), name, self.entries.len() as u32);
        self.entries.push(city);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Drop every entry with `id`. Returns whether anything was removed.
    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.entries.len();
        self.entries.retain(|city| city.id != id);
        self.entries.len() != before
    }

    /// Move the entry found at `after`'s position to `before`'s original index,
    /// then renumber `sort` from 1. Returns the moved entry's new index.
    pub fn reorder(&mut self, before: u32, after: u32) -> Option<usize> {
        let index_before = self.position(before)?;
        let index_after = self.position(after)?;
        if index_before == index_after {
            return None;
        }

        let moved = self.entries.remove(index_after);
        self.entries.insert(index_before, moved);
        for (i, city) in self.entries.iter_mut().enumerate() {
            city.sort = i as u32 + 1;
        }
        Some(index_before)
    }
}

/// Names are compared after trimming surrounding whitespace.
pub fn normalize_name(name: &str) -> Option<String> {
    let name = name.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
