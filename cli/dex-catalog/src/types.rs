//! Catalog interaction types.
//!
//! The `api` module mirrors the JSON documents served by the catalog.
//! The public types are the domain model the rest of the workspace works
//! with; converting from the wire shape is a pure renaming of fields.

use std::str::FromStr;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

pub(crate) mod api {
    use serde::Deserialize;

    #[derive(Debug, Clone, Deserialize)]
    pub struct NamedResource {
        pub name: String,
        #[serde(default)]
        pub url: String,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct ResourceList {
        pub count: u64,
        #[serde(default)]
        pub results: Vec<NamedResource>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct TypeSlot {
        #[serde(rename = "type")]
        pub type_: NamedResource,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct StatSlot {
        pub base_stat: u32,
        pub stat: NamedResource,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct AbilitySlot {
        pub ability: NamedResource,
        #[serde(default)]
        pub is_hidden: bool,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct MoveSlot {
        #[serde(rename = "move")]
        pub move_: NamedResource,
    }

    #[derive(Debug, Clone, Default, Deserialize)]
    pub struct Sprites {
        pub front_default: Option<String>,
        pub back_default: Option<String>,
        pub front_shiny: Option<String>,
        pub back_shiny: Option<String>,
    }

    #[derive(Debug, Clone, Deserialize)]
    pub struct Pokemon {
        pub id: u32,
        pub name: String,
        pub height: u32,
        pub weight: u32,
        pub base_experience: Option<u32>,
        #[serde(default)]
        pub types: Vec<TypeSlot>,
        #[serde(default)]
        pub stats: Vec<StatSlot>,
        #[serde(default)]
        pub abilities: Vec<AbilitySlot>,
        #[serde(default)]
        pub moves: Vec<MoveSlot>,
        #[serde(default)]
        pub sprites: Sprites,
    }
}

// ---------------------------------------------------------------------------
// Index
// ---------------------------------------------------------------------------

/// A lightweight index entry, only used to resolve a full [Creature].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub detail_url: String,
}

impl CatalogEntry {
    /// The numeric id referenced by [Self::detail_url].
    ///
    /// The catalog addresses full records as `.../pokemon/{id}/`,
    /// so the id is the last non-empty path segment.
    pub fn id(&self) -> Option<u32> {
        self.detail_url
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .and_then(|segment| segment.parse::<u32>().ok())
            .filter(|id| *id > 0)
    }
}

impl From<api::NamedResource> for CatalogEntry {
    fn from(resource: api::NamedResource) -> Self {
        Self {
            name: resource.name,
            detail_url: resource.url,
        }
    }
}

/// One page of the catalog index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPage {
    pub entries: Vec<CatalogEntry>,
    /// Total number of entries in the catalog, not just on this page
    pub total: u64,
}

impl From<api::ResourceList> for IndexPage {
    fn from(list: api::ResourceList) -> Self {
        Self {
            entries: list.results.into_iter().map(CatalogEntry::from).collect(),
            total: list.count,
        }
    }
}

/// A category tag such as an elemental type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryLabel {
    pub name: String,
}

impl From<api::NamedResource> for CategoryLabel {
    fn from(resource: api::NamedResource) -> Self {
        Self {
            name: resource.name,
        }
    }
}

// ---------------------------------------------------------------------------
// Full records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureType {
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stat {
    pub stat_key: String,
    pub base_value: u32,
}

impl Stat {
    /// Human readable label for well known stat keys.
    ///
    /// Unknown keys are shown as is.
    pub fn display_name(&self) -> &str {
        match self.stat_key.as_str() {
            "hp" => "HP",
            "attack" => "Attack",
            "defense" => "Defense",
            "special-attack" => "Sp. Attack",
            "special-defense" => "Sp. Defense",
            "speed" => "Speed",
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ability {
    pub name: String,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub name: String,
}

/// Sprite URLs; any variant may be missing upstream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub back_default: Option<String>,
    pub front_shiny: Option<String>,
    pub back_shiny: Option<String>,
}

/// The four image variants shown on a detail page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
pub enum ImageVariant {
    #[default]
    #[display("front")]
    Front,
    #[display("back")]
    Back,
    #[display("shiny-front")]
    ShinyFront,
    #[display("shiny-back")]
    ShinyBack,
}

impl ImageVariant {
    pub const ALL: [ImageVariant; 4] = [
        ImageVariant::Front,
        ImageVariant::Back,
        ImageVariant::ShinyFront,
        ImageVariant::ShinyBack,
    ];
}

impl FromStr for ImageVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ImageVariant::ALL
            .into_iter()
            .find(|variant| variant.to_string() == s)
            .ok_or_else(|| {
                format!("unknown image variant '{s}', expected one of: front, back, shiny-front, shiny-back")
            })
    }
}

/// A complete catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub id: u32,
    pub name: String,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    pub base_experience: u32,
    pub types: Vec<CreatureType>,
    pub stats: Vec<Stat>,
    pub abilities: Vec<Ability>,
    pub moves: Vec<Move>,
    pub sprites: Sprites,
}

impl Creature {
    /// Names of all categories this creature belongs to, in catalog order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.types.iter().map(|t| t.type_name.as_str())
    }

    pub fn height_metres(&self) -> f64 {
        f64::from(self.height) / 10.0
    }

    pub fn weight_kilograms(&self) -> f64 {
        f64::from(self.weight) / 10.0
    }

    /// The sprite URL for `variant`, or an empty string if the catalog has none.
    pub fn sprite(&self, variant: ImageVariant) -> &str {
        let sprite = match variant {
            ImageVariant::Front => &self.sprites.front_default,
            ImageVariant::Back => &self.sprites.back_default,
            ImageVariant::ShinyFront => &self.sprites.front_shiny,
            ImageVariant::ShinyBack => &self.sprites.back_shiny,
        };
        sprite.as_deref().unwrap_or_default()
    }
}

impl From<api::Pokemon> for Creature {
    fn from(raw: api::Pokemon) -> Self {
        Self {
            id: raw.id,
            name: raw.name,
            height: raw.height,
            weight: raw.weight,
            // Some alternate forms carry no experience value.
            base_experience: raw.base_experience.unwrap_or_default(),
            types: raw
                .types
                .into_iter()
                .map(|slot| CreatureType {
                    type_name: slot.type_.name,
                })
                .collect(),
            stats: raw
                .stats
                .into_iter()
                .map(|slot| Stat {
                    stat_key: slot.stat.name,
                    base_value: slot.base_stat,
                })
                .collect(),
            abilities: raw
                .abilities
                .into_iter()
                .map(|slot| Ability {
                    name: slot.ability.name,
                    is_hidden: slot.is_hidden,
                })
                .collect(),
            moves: raw
                .moves
                .into_iter()
                .map(|slot| Move {
                    name: slot.move_.name,
                })
                .collect(),
            sprites: Sprites {
                front_default: raw.sprites.front_default,
                back_default: raw.sprites.back_default,
                front_shiny: raw.sprites.front_shiny,
                back_shiny: raw.sprites.back_shiny,
            },
        }
    }
}

/// How a full record is addressed: by numeric id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display, From)]
pub enum CreatureRef {
    #[display("#{_0}")]
    Id(u32),
    #[display("{_0}")]
    Name(String),
}

impl CreatureRef {
    /// Interpret user input: all digits is an id, anything else a name.
    pub fn parse(input: impl AsRef<str>) -> Self {
        let input = input.as_ref().trim();
        match input.parse::<u32>() {
            Ok(id) => CreatureRef::Id(id),
            Err(_) => CreatureRef::Name(normalize_name(input)),
        }
    }

    /// The path segment used to address this record.
    pub fn path_segment(&self) -> String {
        match self {
            CreatureRef::Id(id) => id.to_string(),
            CreatureRef::Name(name) => normalize_name(name),
        }
    }
}

/// Names are matched case-insensitively by the catalog's lowercase keys.
pub fn normalize_name(name: impl std::fmt::Display) -> String {
    name.to_string().trim().to_lowercase()
}
