//! Builders that serialise archives and tile containers. The extractor only
//! reads; these exist for tooling and for producing test inputs.

pub mod presage;
pub mod xpk;
