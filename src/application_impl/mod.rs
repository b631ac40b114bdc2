mod account_service_impl;
mod credential_hasher_impl;
mod session_service_impl;
mod token_codec_impl;

pub use account_service_impl::*;
pub use credential_hasher_impl::*;
pub use session_service_impl::*;
pub use token_codec_impl::*;
