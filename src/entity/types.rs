use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Entity type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityType {
    Person,
    Organization,
    Location,
    MilitaryUnit,
    Weapon,
    Other,
}

impl EntityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Person => "PERSON",
            EntityType::Organization => "ORG",
            EntityType::Location => "LOCATION",
            EntityType::MilitaryUnit => "MILITARY_UNIT",
            EntityType::Weapon => "WEAPON",
            EntityType::Other => "OTHER",
        }
    }

    pub fn category(&self) -> EntityCategory {
        match self {
            EntityType::MilitaryUnit | EntityType::Weapon => EntityCategory::Defense,
            _ => EntityCategory::Standard,
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<&str> for EntityType {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PERSON" => EntityType::Person,
            "ORG" | "ORGANIZATION" => EntityType::Organization,
            "LOCATION" => EntityType::Location,
            "MILITARY_UNIT" => EntityType::MilitaryUnit,
            "WEAPON" => EntityType::Weapon,
            _ => EntityType::Other,
        }
    }
}

/// Whether an entity is generic or defense-specific.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    Standard,
    Defense,
}

impl EntityCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityCategory::Standard => "STANDARD",
            EntityCategory::Defense => "DEFENSE",
        }
    }
}

impl fmt::Display for EntityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<&str> for EntityCategory {
    fn from(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "DEFENSE" | "DEFENCE" => EntityCategory::Defense,
            _ => EntityCategory::Standard,
        }
    }
}

/// A named thing found in an article's text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub entity_type: EntityType,
    pub category: EntityCategory,
}

impl Entity {
    pub fn new(text: &str, entity_type: EntityType) -> Self {
        Entity {
            text: text.to_string(),
            entity_type,
            category: entity_type.category(),
        }
    }
}

/// Output of an entity extraction backend, grouped the way backends report it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub persons: BTreeSet<String>,
    pub organizations: BTreeSet<String>,
    pub locations: BTreeSet<String>,
    pub military_units: BTreeSet<String>,
    pub weapons: BTreeSet<String>,
}

impl ExtractedEntities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.persons.len()
            + self.organizations.len()
            + self.locations.len()
            + self.military_units.len()
            + self.weapons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flattens into typed rows, standard entities first, each group sorted.
    pub fn to_entities(&self) -> Vec<Entity> {
        let groups = [
            (&self.persons, EntityType::Person),
            (&self.organizations, EntityType::Organization),
            (&self.locations, EntityType::Location),
            (&self.military_units, EntityType::MilitaryUnit),
            (&self.weapons, EntityType::Weapon),
        ];

        groups
            .iter()
            .flat_map(|(names, entity_type)| {
                names.iter().map(move |name| Entity::new(name, *entity_type))
            })
            .collect()
    }
}
