//! # Vertigo Core
//!
//! The domain layer of the Vertigo blogging engine.
//! This crate holds accounts, posts and search logic behind ports; every
//! piece of infrastructure is reached through a trait defined in [`ports`].

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
pub use services::{AccountService, CredentialService, JobRouter, PostService, SearchService};

#[cfg(test)]
pub(crate) mod test_support;
