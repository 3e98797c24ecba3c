//! API route modules.

pub mod verification;
