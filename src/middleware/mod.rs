pub mod auth;
pub mod cron;
pub mod extract;
pub mod response;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use cron::cron_secret_middleware;
pub use extract::ApiJson;
pub use response::{ApiResponse, ApiResult};
