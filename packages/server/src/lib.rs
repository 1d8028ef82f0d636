//! Real-time study room server library.
//!
//! Presence, host election, a shared countdown timer and chat relay for
//! study rooms, delivered over WebSocket.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
