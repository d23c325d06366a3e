//! Auth-domain token models and client-side JWT claim helpers.

pub mod claims;
pub mod token;

pub use claims::{EXPIRY_LEEWAY, TokenClaims};
pub use token::*;
