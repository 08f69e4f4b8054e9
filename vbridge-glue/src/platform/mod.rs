//! Backend adapters.
//!
//! Three adapters implement the [`crate::traits::Platform`] capability set:
//!
//! - [`ComAdapter`] - local COM dispatch; events are pumped through a
//!   per-adapter queue on the constructing thread.
//! - [`XpcomAdapter`] - local XPCOM components; events go through the
//!   backend's native event loop.
//! - [`WebAdapter`] - remote web service; no event transport at all.

pub mod com;
pub mod web;
pub mod xpcom;

pub use com::ComAdapter;
pub use web::WebAdapter;
pub use xpcom::XpcomAdapter;
