//! Relational domain model for the roster and catalog schemas.
//!
//! # Responsibility
//! - Define the entity graph shared by persistence and query layers.
//! - Carry associations as owned values so cascades can walk them.
//!
//! # Invariants
//! - `id == None` means "not yet persisted"; ids are only assigned by the store.
//! - Association graphs are finite trees by construction (no back-pointers).

pub mod audit;
pub mod catalog;
pub mod constraint;
pub mod roster;
