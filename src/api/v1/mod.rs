mod error;
mod handler;
mod router;

pub use error::{ApiError, ApiErrorCode, recover_error};
pub use handler::{ApiResponse, USER_UPGRADED_EVENT};
pub use router::routes;
