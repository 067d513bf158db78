//! Crate-wide error plumbing on top of `failure`.

pub use failure::{Error, ResultExt};

pub type Result<T> = ::std::result::Result<T, ::failure::Error>;
