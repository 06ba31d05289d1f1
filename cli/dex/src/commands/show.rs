use std::time::Duration;

use anyhow::Result;
use bpaf::Bpaf;
use dex_rust_sdk::models::detail::{DetailError, Step, resolve, resolve_step};
use dex_rust_sdk::models::view::{DetailEvent, DetailView};
use dex_rust_sdk::providers::catalog::{Client, Creature, CreatureRef, ImageVariant};
use serde_json::json;
use tokio::runtime::Handle;
use tracing::{debug, instrument};

use crate::utils::dialog::{Dialog, Spinner};
use crate::utils::display::DisplayDetail;
use crate::utils::message;

/// Show all details of a single creature
#[derive(Bpaf, Clone)]
pub struct Show {
    /// Print the record as JSON
    #[bpaf(long)]
    pub json: bool,

    /// Image to show: 'front', 'back', 'shiny-front' or 'shiny-back'
    #[bpaf(long, argument("variant"), fallback(ImageVariant::Front))]
    pub image: ImageVariant,

    #[bpaf(external(neighbor), optional)]
    pub neighbor: Option<Neighbor>,

    /// Id or name of the creature, e.g. '25' or 'pikachu'
    #[bpaf(positional("creature"))]
    pub creature: String,
}

/// Navigate from the requested creature to its neighbor by id
#[derive(Bpaf, Clone, Copy, Debug)]
pub enum Neighbor {
    /// Show the creature with the previous id instead
    #[bpaf(long("previous"))]
    Previous,
    /// Show the creature with the next id instead
    #[bpaf(long("next"))]
    Next,
}

impl From<Neighbor> for Step {
    fn from(neighbor: Neighbor) -> Self {
        match neighbor {
            Neighbor::Previous => Step::Previous,
            Neighbor::Next => Step::Next,
        }
    }
}

impl Show {
    #[instrument(name = "show", skip_all, fields(creature = %self.creature))]
    pub async fn handle(self, client: Client) -> Result<()> {
        let target = CreatureRef::parse(&self.creature);
        let mut view = DetailView::new(target).reduce(DetailEvent::SelectImage(self.image));
        view = load(view, &client)?;

        if let Some(neighbor) = self.neighbor {
            view = navigate(view, Step::from(neighbor), &client)?;
        }

        let Some(creature) = view.creature() else {
            // `load` only returns loaded views
            return Ok(());
        };

        if self.json {
            let output = json!({
                "creature": creature,
                "image": {
                    "variant": view.image,
                    "url": view.image_url(),
                },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        println!("{}", DisplayDetail {
            creature,
            image: view.image,
        });
        Ok(())
    }
}

/// Resolve the view's target, failing if it cannot be shown.
fn load(view: DetailView, client: &Client) -> Result<DetailView, DetailError> {
    let target = view.target.clone();
    let resolved: Result<Creature, DetailError> = Dialog {
        message: &format!("Loading '{target}'..."),
        help_message: None,
        typed: Spinner::new(|| Handle::current().block_on(resolve(client, &target))),
    }
    .spin_with_delay(Duration::from_secs(1));

    match resolved {
        Ok(creature) => Ok(view.reduce(DetailEvent::Loaded(creature))),
        Err(err) => {
            debug!(%target, not_found = err.is_not_found(), "failed to load creature");
            Err(err)
        },
    }
}

/// Move a loaded view one `step` to its neighbor.
///
/// Keeps the view if there is no such neighbor.
fn navigate(view: DetailView, step: Step, client: &Client) -> Result<DetailView, DetailError> {
    let Some(current) = view.creature() else {
        return Ok(view);
    };
    let direction = match step {
        Step::Previous => "previous",
        Step::Next => "next",
    };

    let stepped = Dialog {
        message: &format!("Loading the {direction} creature..."),
        help_message: None,
        typed: Spinner::new(|| Handle::current().block_on(resolve_step(client, current, step))),
    }
    .spin_with_delay(Duration::from_secs(1));

    match stepped {
        Some(Ok(creature)) => {
            debug!(?step, id = creature.id, "navigated");
            Ok(view
                .reduce(DetailEvent::Navigate(step))
                .reduce(DetailEvent::Loaded(creature)))
        },
        Some(Err(err)) => Err(err),
        None => {
            message::info(format!(
                "There is no {direction} creature, showing '{}' instead.",
                view.target
            ));
            Ok(view)
        },
    }
}
