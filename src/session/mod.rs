//! Video session management
//!
//! This module provides the `VideoSession` abstraction that manages:
//! - Frame intake from the video transport
//! - Emotion sampling on a worker task
//! - Reconnect accounting
//! - Session statistics and state management

mod config;
mod session;
mod stats;

pub use config::SessionConfig;
pub use session::VideoSession;
pub use stats::SessionStats;
