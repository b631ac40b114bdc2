// capabilities

mod clock;

pub use clock::*;

// repo

mod refresh_token_repo;
mod store_error;
mod user_repo;

pub use refresh_token_repo::*;
pub use store_error::*;
pub use user_repo::*;
