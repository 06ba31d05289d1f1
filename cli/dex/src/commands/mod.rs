mod gallery;
mod search;
mod show;

use std::fmt;

use anyhow::Result;
use bpaf::Bpaf;
use dex_rust_sdk::models::filter::{SortDirection, SortKey, SortSpec};
use indoc::indoc;
use tracing::debug;

use crate::config::Config;
use crate::utils::init::init_catalog_client;

static DEX_DESCRIPTION: &'_ str = indoc! {"
    Browse, search and inspect the creature catalog.\n\n

    Use 'dex gallery' to browse, 'dex search <name>' to look a creature up by name
    and 'dex show <id|name>' to see all of its details."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(DEX_DESCRIPTION), version)]
pub struct DexCli(#[bpaf(external(dex_args))] pub DexArgs);

/// Main dex args parser
///
/// To parse the dex CLI, use [`DexCli`] instead using [`dex_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)] // we don't want this struct to be interpreted as a group
pub struct DexArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands))]
    command: Commands,
}

impl DexArgs {
    pub async fn handle(self, config: Config) -> Result<()> {
        debug!(command = ?self.command, "handling command");
        let client = init_catalog_client(&config)?;

        match self.command {
            Commands::Search(args) => args.handle(config, client).await,
            Commands::Gallery(args) => args.handle(config, client).await,
            Commands::Show(args) => args.handle(client).await,
        }
    }
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Search creatures by name
    #[bpaf(command)]
    Search(#[bpaf(external(search::search))] search::Search),

    /// Browse the first creatures of the catalog
    #[bpaf(command)]
    Gallery(#[bpaf(external(gallery::gallery))] gallery::Gallery),

    /// Show all details of a single creature
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Commands::Search(_) => write!(f, "search"),
            Commands::Gallery(_) => write!(f, "gallery"),
            Commands::Show(_) => write!(f, "show"),
        }
    }
}

/// Sorting options shared by commands that list creatures
#[derive(Debug, Bpaf, Clone, Copy, Default)]
pub struct SortArgs {
    /// Sort by 'name', 'height', 'weight' or 'base-experience'
    #[bpaf(long("sort"), argument("key"))]
    pub key: Option<SortKey>,

    /// Sort in descending order (sorts by name if no key is given)
    #[bpaf(long)]
    pub desc: bool,
}

impl SortArgs {
    /// The requested sort, `None` if the original order should be kept
    pub fn spec(&self) -> Option<SortSpec> {
        let key = self.key.or(self.desc.then_some(SortKey::Name))?;
        let direction = if self.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Some(SortSpec::new(key, direction))
    }
}
