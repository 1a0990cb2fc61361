pub mod api_error;
pub mod auth;
pub mod server;
pub mod types;
pub mod validator;

pub use api_error::{ApiError, ApiResult};
pub use auth::AuthConfig;
pub use server::{create_router, start_server, AppState, ServerConfig};
