//! myPins sync core.
//!
//! Client-side data layer of the myPins personal pinboard: tasks, bookmarks
//! and notes mirrored from a remote document store through owner-scoped live
//! subscriptions. Each entity kind gets a collection synchronizer (cache +
//! mediated writes) and a pure view-filter engine; a session provider gates
//! the subscriptions and a workspace wires the services together.
//!
//! All persistence is delegated to the [`store::DocumentStore`] backend.
//! Writes are fire-and-forget toward callers: drops and store failures are
//! logged and reported through an explicit `Result` that callers may ignore.

pub mod logging;
pub mod plugins;
pub mod session;
pub mod settings;
pub mod shared;
pub mod store;
pub mod sync;
pub mod workspace;
