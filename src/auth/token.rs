//! Access tokens, their wire representation, and the redacting secret wrapper.

pub mod record;
pub mod response;
pub mod secret;
