pub mod providers;
pub mod utils;

pub mod models;

#[cfg(any(test, feature = "tests"))]
pub mod test_helpers;
