pub mod pass;
pub mod quad;
