//! Invalidation notifications
//!
//! One [`InvalidationBus`] per topic (`entities`, `triggers`, `checkers`,
//! `components`). Dependent subsystems subscribe and recompute when told;
//! bursts of edits produce one callback per window.

mod bus;
mod store;

pub use bus::{InvalidationBus, SubscriptionId};
pub use store::NotifyingStore;
