//! Core types and trait definitions for the Pact stay-agreement subsystem.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the agreement model, the signing state machine, the clause composer, the
//! integrity sealer and the seams (store, directories, notifier, renderer)
//! that the other crates implement.

// Native `async fn` in traits; the store traits spell out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod agreement;
pub mod composer;
pub mod directory;
pub mod document;
pub mod error;
pub mod lifecycle;
pub mod notify;
pub mod seal;
pub mod store;

pub use error::{Error, ErrorKind, Result};
