//! Operational tasks run from the command line rather than over HTTP.

pub mod fetch;
pub mod rewrite;
pub mod seed;

pub use fetch::{FetchError, FetchReport, HttpImageSource, ImageFetcher};
pub use rewrite::{ImageRewriter, LocalFileIndex, RewriteError, RewriteReport, UrlMapping};
pub use seed::{seed_catalog, SeedReport};
