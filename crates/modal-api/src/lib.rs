pub mod assistant;
pub mod auth;
pub mod calculations;
pub mod error;
pub mod export;
pub mod logic;
pub mod messages;
pub mod middleware;
pub mod migrate;
pub mod preferences;
pub mod quiz;
pub mod report;
pub mod routes;
pub mod users;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use middleware::decode_token;
pub use report::PdfRenderer;
pub use routes::router;
