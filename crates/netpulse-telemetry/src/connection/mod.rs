//! Push channel lifecycle: state machine, handshake watchdog, reader task
//! and reconnect-on-drop.

mod handle;
pub mod manager;
mod reader;
pub mod state;
pub mod watchdog;

pub use manager::{ConnectionManager, Target};
pub use state::ConnectionState;
