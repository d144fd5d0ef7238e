//! Document platform access: authentication, session, REST client and the
//! content-replacement protocol.

pub mod auth;
pub mod client;
mod error;
pub mod gateway;
pub mod replace;
pub mod session;
pub mod transport;

pub use client::PlatformClient;
pub use error::{AuthError, PlatformError};
pub use gateway::DocumentGateway;
pub use session::{Session, SessionFile};
pub use transport::Transport;
