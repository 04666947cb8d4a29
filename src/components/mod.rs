//! UI components built with Leptos.
//!
//! - [`router`] - route/view binding (main entry point)
//! - [`navbar`] - navigation tabs and the connect/disconnect affordance
//! - [`views`] - the marketplace views receiving the session

pub mod navbar;
pub mod router;
pub mod views;

pub use router::RouteViewBinder;
