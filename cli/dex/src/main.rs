use std::process::ExitCode;

use anyhow::Result;
use bpaf::{Args, Parser};
use commands::{DexArgs, DexCli};
use dex_rust_sdk::models::detail::DetailError;
use dex_rust_sdk::models::gallery::GalleryError;
use dex_rust_sdk::models::search::SearchError;
use dex_rust_sdk::providers::catalog::{CatalogClientError, MockDataError};
use tracing::debug;
use utils::init::init_logger;
use utils::message;

use crate::utils::errors::{
    format_catalog_error,
    format_detail_error,
    format_gallery_error,
    format_mock_data_error,
    format_search_error,
};

mod commands;
mod config;
mod utils;

async fn run(args: DexArgs) -> Result<()> {
    init_logger(Some(args.verbosity));
    let config = config::Config::parse()?;
    debug!(?config, "loaded config");
    args.handle(config).await
}

fn main() -> ExitCode {
    // initialize logger with "best guess" defaults
    // updating the logger conf is cheap, so we reinitialize whenever we get more information
    init_logger(None);

    // Parse verbosity flags to affect help message/parse errors
    let verbosity = {
        let verbosity_parser = commands::verbosity();
        let other_parser = bpaf::any("_", Some::<String>).many();

        bpaf::construct!(verbosity_parser, other_parser)
            .map(|(v, _)| v)
            .to_options()
            .run_inner(Args::current_args())
            .unwrap_or_default()
    };

    init_logger(Some(verbosity));

    // Run the argument parser
    //
    // Pass through Completion "failure"; In completion mode this needs to be printed as is
    // to work with the shell completion frontends
    //
    // Pass through Stdout failure; This represents `--help` and `--version`
    let args = match commands::dex_cli().run_inner(Args::current_args()) {
        Ok(DexCli(args)) => args,
        Err(bpaf::ParseFailure::Stdout(m, _)) => {
            print!("{m:80}");
            return ExitCode::from(0);
        },
        Err(bpaf::ParseFailure::Stderr(m)) => {
            message::error(format!("{m:80}"));
            return ExitCode::from(1);
        },
        Err(bpaf::ParseFailure::Completion(c)) => {
            print!("{c}");
            return ExitCode::from(0);
        },
    };

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            message::error(format!("Could not start the async runtime: {e}"));
            return ExitCode::from(1);
        },
    };

    // Run dex. Print errors and exit with status 1 on failure
    match runtime.block_on(run(args)) {
        Ok(()) => ExitCode::from(0),

        Err(e) => {
            debug!("{:#}", e);

            if let Some(e) = e.downcast_ref::<DetailError>() {
                message::error(format_detail_error(e));
                return ExitCode::from(1);
            }

            if let Some(e) = e.downcast_ref::<SearchError>() {
                message::error(format_search_error(e));
                return ExitCode::from(1);
            }

            if let Some(e) = e.downcast_ref::<GalleryError>() {
                message::error(format_gallery_error(e));
                return ExitCode::from(1);
            }

            if let Some(e) = e.downcast_ref::<CatalogClientError>() {
                message::error(format_catalog_error(e));
                return ExitCode::from(1);
            }

            if let Some(e) = e.downcast_ref::<MockDataError>() {
                message::error(format_mock_data_error(e));
                return ExitCode::from(1);
            }

            let err_str = e
                .chain()
                .skip(1)
                .fold(e.to_string(), |acc, cause| format!("{}: {}", acc, cause));

            message::error(err_str);

            ExitCode::from(1)
        },
    }
}
