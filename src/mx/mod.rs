//! DNS MX resolution with RFC 7505 null MX handling.
//!
//! The public entry point is [`resolve_mx`], which performs a synchronous
//! lookup using the system resolver and returns a [`MxStatus`]: the usable
//! exchanges in the order they should be tried, or `NotFound`.

mod error;
mod options;
mod resolver;
mod types;

pub use error::MxError;
pub use options::ResolverOptions;
pub use resolver::{LookupMx, MxResolver, resolve_mx, resolve_mx_with_options, resolve_with};
pub use types::{MxRecord, MxStatus, NotFoundReason};

#[cfg(test)]
mod tests;
