//! Token secrets, credential pairs, and access-token claim decoding.

pub mod claims;
pub mod pair;
pub mod secret;
