pub mod addon;
pub mod error;
pub mod handlers;
pub mod links;
pub mod media;
pub mod middleware;
pub mod routes;

pub use error::{ApiError, ErrorResponse};
pub use routes::create_router;
