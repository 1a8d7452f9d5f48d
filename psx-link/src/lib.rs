//! PS1/PS2 controller link for hosts that drive the pad's lines directly.
//!
//! The controller speaks a synchronous, clock-strobed serial protocol. The
//! host owns the clock, pushes one command bit and samples one data bit per
//! cycle, and frames every exchange as 9 bytes behind an attention line.
//! There is no dedicated peripheral involved: [`LinePort`] is the only
//! contact with hardware, so the same code runs against GPIO pins through
//! [`HalLines`] or against the software peer in [`sim`].
//!
//! Layers, leaves first:
//! - [`bitclock`]: one byte each way, LSB first
//! - [`transport`]: one 9-byte frame around an attention assertion
//! - [`session`]: per-pad state, polling, mode and motor configuration
//! - [`buttons`]: button catalogue and the decoded query surface

pub mod bitclock;
pub mod buttons;
pub mod command;
pub mod error;
pub mod frame;
pub mod lines;
pub mod session;
pub mod sim;
pub mod timing;
pub mod transport;

// Re-export main types for convenience
pub use buttons::{Axis, Button, PadMode};
pub use command::{Mode, ModeLock, Motor1, Motor1Enable, Motor2Enable};
pub use embedded_hal;
pub use error::Error;
pub use frame::{Frame, KeyState, FRAME_LEN};
pub use lines::{HalLines, LinePort, OutputLine, Pad};
pub use session::Session;
pub use timing::{Platform, TimingProfile};
pub use transport::FrameTransport;
