use crate::error::Error;
use std::result;

/// A convenience alias for results returned by engine operations.
pub type Result<T> = result::Result<T, Error>;
