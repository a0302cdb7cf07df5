//! System orchestration, startup, and shutdown logic.

pub mod console_system;
pub mod telemetry;

pub use self::console_system::*;
pub use self::telemetry::*;
