use dex_rust_sdk::models::detail::DetailError;
use dex_rust_sdk::models::gallery::GalleryError;
use dex_rust_sdk::models::search::SearchError;
use dex_rust_sdk::providers::catalog::{CatalogClientError, MockDataError};
use indoc::formatdoc;
use tracing::trace;

/// Points the user back at the entry points of the CLI
pub const HOME_HINT: &str =
    "Use 'dex gallery' to browse the catalog or 'dex search <name>' to find a creature.";

pub fn format_catalog_error(err: &CatalogClientError) -> String {
    trace!("formatting catalog error: {err:?}");

    match err {
        CatalogClientError::NotFound(subject) => formatdoc! {"
            '{subject}' does not exist in the catalog.

            {HOME_HINT}
        "},
        err if err.is_timeout() => formatdoc! {"
            The catalog did not respond in time.

            Check your network connection or raise 'request_timeout_ms' in your dex config.
        "},
        CatalogClientError::Transport { url, .. } => formatdoc! {"
            Could not reach the catalog at '{url}'.

            Check your network connection or the 'catalog_url' in your dex config.
        "},
        CatalogClientError::UnexpectedStatus { status, .. } if *status >= 500 => formatdoc! {"
            The catalog is currently unavailable (status {status}).

            Please try again later.
        "},
        CatalogClientError::UnexpectedStatus { .. }
        | CatalogClientError::InvalidResponse { .. }
        | CatalogClientError::InvalidConfig(_) => display_chain(err),
    }
}

pub fn format_search_error(err: &SearchError) -> String {
    trace!("formatting search error: {err:?}");

    match err {
        SearchError::Index(source) => format_catalog_error(source),
        SearchError::PartialBatchFailure(failure) => {
            let failed = failure
                .failures
                .iter()
                .map(|failure| format!("  - {failure}"))
                .collect::<Vec<_>>()
                .join("\n");
            formatdoc! {"
                {failure}:
                {failed}

                Set 'batch_policy = \"tolerant\"' in your dex config to show the remaining results.
            "}
        },
    }
}

pub fn format_gallery_error(err: &GalleryError) -> String {
    trace!("formatting gallery error: {err:?}");

    match err {
        GalleryError::Index(source) | GalleryError::Categories(source) => {
            format!("{err}: {}", format_catalog_error(source))
        },
    }
}

pub fn format_detail_error(err: &DetailError) -> String {
    trace!("formatting detail error: {err:?}");

    match err {
        DetailError::NotFound(target) => formatdoc! {"
            Creature not found: '{target}' does not exist in the catalog.

            {HOME_HINT}
        "},
        DetailError::Catalog { source, .. } => format_catalog_error(source),
    }
}

pub fn format_mock_data_error(err: &MockDataError) -> String {
    display_chain(err)
}

/// Render an error and all of its sources on a single line.
pub fn display_chain(mut err: &dyn std::error::Error) -> String {
    let mut fmt = err.to_string();
    while let Some(source) = err.source() {
        fmt = format!("{fmt}: {source}");
        err = source;
    }

    fmt
}
