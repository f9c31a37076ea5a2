//! Client core for the admin console
//!
//! Components never call the backend directly for reads: services own
//! broadcast feeds with retained last values, components subscribe and
//! render. Writes go through explicit async operations that perform the
//! HTTP call and then reload the full collection.
//!
//! Two consumers are built on top of that model:
//!
//! - [`TimingsView`] — reconciles the raw timings feed against the
//!   operations feed into an enriched, sorted display list, preserving
//!   per-row transient UI state across updates.
//! - [`UsersService`] — a cached CRUD proxy over the user administration
//!   REST resources, cold-loaded once when the auth profile gains the
//!   admin scope.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use console_client::{ClientConfig, TracingReporter, UsersApi, UsersService};
//!
//! # async fn example() {
//! let api = UsersApi::new(ClientConfig {
//!     base_url: "https://console.example.com/api".into(),
//!     ..Default::default()
//! });
//! let service = Arc::new(UsersService::new(api, Arc::new(TracingReporter)));
//!
//! let users = service.subscribe();
//! service.refresh().await;
//! println!("{} users", users.borrow().len());
//! # }
//! ```

pub mod api;
pub mod config;
pub mod dialog;
pub mod error;
pub mod feed;
pub mod model;
pub mod report;
pub mod timings;
pub mod users;

// Re-export main types
pub use api::UsersApi;
pub use config::ClientConfig;
pub use dialog::{CreateTimingDialog, PromptOutcome, Prompter, SelectOption};
pub use error::{ClientError, Result};
pub use feed::Feed;
pub use model::{DisplayTiming, Operation, Timing, User, ADMIN_SCOPE, UNRESOLVED_OPERATION};
pub use report::{ErrorReporter, TracingReporter};
pub use timings::{TimingsBackend, TimingsView};
pub use users::UsersService;
