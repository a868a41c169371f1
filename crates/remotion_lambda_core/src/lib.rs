//! Wire contract for the Remotion render function.
//!
//! This crate owns payload construction, input props serialization and
//! response decoding. It intentionally excludes AWS SDK concerns so the
//! contract can be tested without credentials or network access.

pub mod contract;
pub mod input_props;
pub mod response;
pub mod storage_keys;
