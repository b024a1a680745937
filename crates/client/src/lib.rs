//! Client side of the IKD lecturer performance pages.
//!
//! [`session::UnitPage`] is the entry point: it talks to the backend
//! through an [`backend::IkdBackend`], keeps the evidence map fresh with a
//! polling loop and debounces score edits.

pub mod api;
pub mod backend;
pub mod board;
pub mod config;
pub mod debounce;
pub mod download;
pub mod error;
pub mod events;
pub mod fake;
pub mod ledger;
pub mod loader;
pub mod scores;
pub mod session;
pub mod sync;

pub use api::{ApiError, IkdApi};
pub use backend::IkdBackend;
pub use config::{ClientConfig, PageConfig};
pub use error::{ClientError, ClientResult};
pub use events::PageEvent;
pub use session::UnitPage;
