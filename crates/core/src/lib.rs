//! Core domain for the newsdesk content backend: live documents, the
//! recycle bin lifecycle and the storage contract both sit here.

pub mod clock;
pub mod document;
pub mod error;
pub mod events;
pub mod recycle_bin;
pub mod store;

pub use error::{CoreError, Result};
