//! Token models produced by the authorization endpoint.

pub mod token;

pub use token::{record::*, response::*, secret::*};
