//! Chrome DevTools Protocol message types.
//!
//! This module defines the JSON messages exchanged with the browser over
//! its debugging WebSocket.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Client → Browser | Command request |
//! | `Response` | Browser → Client | Command result or error |
//! | `Event` | Browser → Client | Unsolicited notification |
//!
//! # Command Naming
//!
//! Commands follow `Domain.methodName` format:
//!
//! - `Target.attachToTarget`
//! - `Runtime.evaluate`
//! - `Page.printToPDF`
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions by domain |
//! | `event` | Event types |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by domain.
pub mod command;

/// Event message types.
pub mod event;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    BrowserCommand, Command, PageCommand, PrintOptions, RuntimeCommand, TargetCommand,
};
pub use event::{Event, ParsedEvent};
pub use request::{Request, Response, ResponseError};
