//! Builders for catalog fixtures used across tests.

use proptest::prelude::*;

use crate::providers::catalog::{
    Ability,
    CatalogEntry,
    CategoryLabel,
    Creature,
    CreatureType,
    MockCatalog,
    Move,
    Sprites,
    Stat,
};

/// A creature with the given categories and plausible defaults for everything else.
pub fn creature(id: u32, name: &str, categories: &[&str]) -> Creature {
    Creature {
        id,
        name: name.to_string(),
        height: 10,
        weight: 100,
        base_experience: 64,
        types: categories
            .iter()
            .map(|name| CreatureType {
                type_name: name.to_string(),
            })
            .collect(),
        stats: vec![Stat {
            stat_key: "hp".to_string(),
            base_value: 45,
        }],
        abilities: vec![Ability {
            name: "overgrow".to_string(),
            is_hidden: false,
        }],
        moves: vec![Move {
            name: "tackle".to_string(),
        }],
        sprites: Sprites {
            front_default: Some(format!("https://sprites.example/{id}.png")),
            ..Default::default()
        },
    }
}

/// The index entry the catalog would list for `creature`.
pub fn entry(creature: &Creature) -> CatalogEntry {
    CatalogEntry {
        name: creature.name.clone(),
        detail_url: format!("https://pokeapi.co/api/v2/pokemon/{}/", creature.id),
    }
}

/// A mock catalog serving `creatures` in the given index order.
///
/// The category vocabulary is every category used, in first-seen order.
pub fn mock_catalog(creatures: Vec<Creature>) -> MockCatalog {
    let mut categories: Vec<CategoryLabel> = Vec::new();
    for name in creatures.iter().flat_map(|c| c.category_names()) {
        if !categories.iter().any(|label| label.name == name) {
            categories.push(CategoryLabel {
                name: name.to_string(),
            });
        }
    }

    MockCatalog {
        index: creatures.iter().map(entry).collect(),
        categories,
        creatures,
        ..Default::default()
    }
}

pub fn arb_creature() -> impl Strategy<Value = Creature> {
    (
        1..2000_u32,
        "[a-zA-Z][a-z-]{0,8}",
        0..50_u32,
        0..1000_u32,
        0..400_u32,
        proptest::sample::subsequence(vec!["fire", "water", "grass", "electric"], 0..=2),
    )
        .prop_map(|(id, name, height, weight, base_experience, categories)| {
            let mut creature = creature(id, &name, &categories);
            creature.height = height;
            creature.weight = weight;
            creature.base_experience = base_experience;
            creature
        })
}

pub fn arb_creatures() -> impl Strategy<Value = Vec<Creature>> {
    proptest::collection::vec(arb_creature(), 0..12)
}
