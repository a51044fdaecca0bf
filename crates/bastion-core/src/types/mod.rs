//! Bastion data types

pub mod context;
pub mod credential;
pub mod entry;
pub mod outcome;
pub mod profile;

pub use context::*;
pub use credential::*;
pub use entry::*;
pub use outcome::*;
pub use profile::*;
