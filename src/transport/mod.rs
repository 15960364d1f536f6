//! WebSocket transport layer.
//!
//! This module handles communication between the local end (Rust) and the
//! browser's DevTools endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  ChromeHost     │         WebSocket            │  Chrome         │
//! │                 │─────────────────────────────►│                 │
//! │  Connection     │   /devtools/browser/<id>     │  DevTools       │
//! │                 │◄─────────────────────────────│  endpoint       │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `resolve_ws_url` - Turn `http://host:port` into the browser WebSocket URL
//! 2. `Connection::connect` - Open the socket, spawn the event loop
//! 3. `Connection::send` - Send commands, receive correlated responses
//! 4. `Connection::shutdown` - Close the socket
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket connection and event loop |
//! | `discovery` | `/json/version` endpoint discovery |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket connection and event loop.
pub mod connection;

/// DevTools endpoint discovery.
pub mod discovery;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{Connection, DEFAULT_COMMAND_TIMEOUT};
pub use discovery::{BrowserVersion, resolve_ws_url};
