//! Prerna storefront service.
//!
//! Catalog browsing, WhatsApp ordering, customer reviews and homepage
//! content behind a JSON API, with an admin back-office guarded by a bearer
//! token.

pub mod app;
pub mod maintenance;
pub mod modules;
pub mod state;
pub mod utils;

pub use app::App;
pub use state::AppState;
