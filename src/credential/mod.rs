//! Turning `Authorization` headers into credentials.
//!
//! Nothing here touches storage or the clock; callers get either the raw
//! credential string or a [`CredentialError`].

mod api_key;
mod extractor;

pub use api_key::*;
pub use extractor::*;
