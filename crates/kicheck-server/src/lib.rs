//! HTTP surface: routes, application state, and the request pipeline.

mod error;
mod handlers;
pub mod pipeline;
mod routes;
mod server;
mod state;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use server::serve;
pub use state::AppState;
