//! # sugar-session
//!
//! Client-side session manager for the SugarCRM REST v10 API.
//!
//! ## Core Types
//!
//! - [`Session`] - token lifecycle, generic JSON call, metadata loading, queries
//! - [`SessionInfo`] - user profile, ACLs, preferences and module list
//! - [`Query`] - `/{module}/filter` request descriptor
//! - [`Error`] - error taxonomy
//!
//! ## Seams
//!
//! - [`Transport`] - one HTTP exchange; [`ReqwestTransport`] in production
//! - [`SessionConfig`] - server, OAuth client identity and transport settings
//!
//! ## Example
//!
//! ```rust,ignore
//! use sugar_session::{Query, Session};
//!
//! let session = Session::new("https://crm.example.com")?;
//! session.connect("jim", "jim").await?;
//!
//! let info = session.info().await;
//! println!("logged in as {}", info.full_name);
//!
//! let contacts = session.run_query(&Query::new("Contacts")).await?;
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod info;
pub mod logging;
pub mod query;
pub mod session;
pub mod transport;

pub use auth::TokenPair;
pub use config::SessionConfig;
pub use error::{Error, Result};
pub use info::SessionInfo;
pub use query::Query;
pub use session::Session;
pub use transport::{HttpRequest, HttpResponse, ReqwestTransport, Transport};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
