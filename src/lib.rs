//! Client for the Trumba calendar services used by the three campus
//! deployments: calendar listings, per-calendar user permissions, published
//! `.ics` feeds, and editor-account management. Requests and responses are
//! logged through `tracing`; install a subscriber to see them.

pub mod account;
pub mod calendars;
pub mod campus;
pub mod client;
pub mod config;
pub mod error;
pub mod feed;
pub mod model;
pub mod permissions;
mod response;

pub use calendars::Calendars;
pub use campus::Campus;
pub use client::{CampusClient, FeedClient, HttpResponse, ServiceClients};
pub use config::Config;
pub use error::{Result, TrumbaError};
pub use model::{Calendar, GroupType, Permission, PermissionLevel};
pub use permissions::Permissions;
