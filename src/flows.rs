//! Token acquisition flows.

pub mod client_credentials;
pub mod refresher;

pub use client_credentials::*;
pub use refresher::*;
