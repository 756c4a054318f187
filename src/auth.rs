//! Auth-domain identifiers, credential pairs, decoded claims, and the persisted session.

pub mod id;
pub mod session;
pub mod token;

pub use id::*;
pub use session::*;
pub use token::{claims::*, pair::*, secret::*};
