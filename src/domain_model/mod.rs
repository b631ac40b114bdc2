mod platform;
mod refresh_token;
mod user;

pub use platform::*;
pub use refresh_token::*;
pub use user::*;
