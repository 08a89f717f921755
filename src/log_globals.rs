//! Global log stream instance.
//!
//! Single stream: the firmware runs one task, producers are the dispatcher
//! and the player, the consumer is the serial drain in the main loop.

use crate::logging::LogStream;

/// Diagnostic log stream.
///
/// Filled by the dispatcher and startup code, drained to UART0 between
/// input ticks.
pub static DIAG_LOG: LogStream = LogStream::new();
