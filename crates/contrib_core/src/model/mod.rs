//! Domain model for collected contribution facts and their catalog parents.
//!
//! # Responsibility
//! - Define the write-side records supplied by the collection process.
//! - Keep validation rules next to the records they protect.
//!
//! # Invariants
//! - A contribution is identified across runs by its `url`, never by `id`.
//! - Every contribution carries the `run_id` of the run that observed it.

pub mod catalog;
pub mod contribution;
