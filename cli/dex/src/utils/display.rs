use std::fmt::Display;

use dex_rust_sdk::models::detail::MoveSummary;
use dex_rust_sdk::providers::catalog::{Creature, ImageVariant};
use itertools::Itertools;

/// A list of creatures rendered as a table-ish list, one creature per line.
pub struct DisplayCreatures<'a>(pub Vec<&'a Creature>);

impl Display for DisplayCreatures<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name_width = self
            .0
            .iter()
            .map(|c| c.name.chars().count())
            .max()
            .unwrap_or_default();

        let mut creatures = self.0.iter().peekable();
        while let Some(creature) = creatures.next() {
            let id = format!("#{}", creature.id);
            write!(
                f,
                "{id:>6}  {name:<name_width$}  {categories}",
                name = creature.name,
                categories = creature.category_names().join(", "),
            )?;
            // Only print a newline if there are more items to print
            if creatures.peek().is_some() {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

/// The detail page of a single creature.
pub struct DisplayDetail<'a> {
    pub creature: &'a Creature,
    pub image: ImageVariant,
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn field(
    f: &mut std::fmt::Formatter<'_>,
    label: impl Display,
    value: impl Display,
) -> std::fmt::Result {
    writeln!(f, "{label:<16} {value}", label = label.to_string())
}

impl Display for DisplayDetail<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let creature = self.creature;

        writeln!(f, "#{} {}", creature.id, title_case(&creature.name))?;
        field(f, "Types:", creature.category_names().join(", "))?;
        field(f, "Height:", format_args!("{:.1} m", creature.height_metres()))?;
        field(f, "Weight:", format_args!("{:.1} kg", creature.weight_kilograms()))?;
        field(f, "Base experience:", creature.base_experience)?;

        let image = match creature.sprite(self.image) {
            "" => "not available",
            url => url,
        };
        field(f, format_args!("Image ({}):", self.image), image)?;

        writeln!(f)?;
        writeln!(f, "Stats:")?;
        for stat in &creature.stats {
            writeln!(f, "  {:<12} {:>3}", stat.display_name(), stat.base_value)?;
        }

        writeln!(f)?;
        let abilities = creature
            .abilities
            .iter()
            .map(|ability| {
                if ability.is_hidden {
                    format!("{} (hidden)", ability.name)
                } else {
                    ability.name.clone()
                }
            })
            .join(", ");
        field(f, "Abilities:", abilities)?;
        write!(f, "{:<16} {}", "Moves:", MoveSummary::of(creature))
    }
}
