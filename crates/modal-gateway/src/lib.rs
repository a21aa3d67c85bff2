//! `/ws` relay: calculation rooms and presence announcements.

pub mod connection;
pub mod dispatcher;

pub use connection::handle_connection;
pub use dispatcher::{ConnId, Dispatcher};
