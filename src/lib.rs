//! # binthere-gateway
//!
//! REST API and WebSocket gateway behind the BinThere smart dustbin
//! dashboard.
//!
//! Bins report fill levels for wet and dry waste; the gateway stores
//! readings, raises a notification when a bin crosses the critical
//! threshold, keeps bin identifiers contiguous (`001..N`) when bins are
//! retired, and aggregates history into chart-ready series.
//!
//! ## Architecture
//!
//! ```text
//! Clients (dashboard, sensors, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── Dustbin / Notification / Analytics / Auth services (service/)
//!     ├── EventBus (domain/)
//!     │
//!     └── DataSource (persistence/): PostgreSQL or in-memory demo fleet
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod server;
pub mod service;
pub mod ws;
