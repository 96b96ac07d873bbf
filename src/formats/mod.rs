//! Resource formats found inside Presage archives

pub mod clu;
pub mod xpk;
pub mod xpk_decoder;

pub use clu::{Clu, Rgb};
pub use xpk::{Xpk, XpkEntry, XpkReader};
pub use xpk_decoder::XpkDecoder;
