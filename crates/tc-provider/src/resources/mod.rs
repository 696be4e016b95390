//! Resource types exported by the package.

mod random;

pub use random::{Random, MAX_RANDOM_LENGTH, RANDOM_TOKEN};
