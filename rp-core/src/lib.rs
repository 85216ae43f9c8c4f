#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
    missing_docs,
    clippy::missing_docs_in_private_items,
)]
//! Shared plumbing for the road planner crates: logging setup and error helpers.

pub mod errors;
pub mod logging;

/// Everything a crate needs to define and raise its errors.
pub mod prelude {
    pub use crate::errors::*;
}
