//! # tinyframe
//!
//! a minimal in-memory labelled tabular data engine: labelled rows and
//! columns ([`df::index`]), a store of reference-counted typed columns
//! ([`df::column`], [`df::store`]), source adapters in front of it
//! ([`df::source`]) and an elementwise numeric engine plus a summary
//! introspector behind it ([`df::frame`]).

pub mod df;
pub mod errors;
pub mod toolkit;
