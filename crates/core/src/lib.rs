//! Domain logic for recording lecturer performance indicators (IKD).
//!
//! Everything in this crate is pure: no I/O, no clocks other than the
//! timestamp stamped on a report. The HTTP client, the sync loop and the
//! exporters live in sibling crates and build on these types.

pub mod catalog;
pub mod error;
pub mod evidence;
pub mod numbering;
pub mod pagination;
pub mod report;
pub mod roles;
pub mod roster;
pub mod score;
pub mod types;
pub mod units;
pub mod upload;
