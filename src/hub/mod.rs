//! The coordinating loop and everything between it and the peers.
//!
//! - [`Coordinator`]: Owns registry, game and jackpot; handles one [`Event`] at a time
//! - [`HubHandle`]: Cloneable sender into the loop
//! - [`Registry`]: Player seats plus the single host slot, with fan-out
//! - [`Outbox`]: Per-peer bounded queue; full means drop, never block
//! - [`Timer`]: Deadline and cooldown alarms fed back as events
//! - [`Protocol`]: JSON codec for [`ServerMessage`], [`PlayerMessage`], [`HostMessage`]
mod coordinator;
mod event;
mod handle;
mod message;
mod outbox;
mod protocol;
mod registry;
mod timer;

pub use coordinator::*;
pub use event::*;
pub use handle::*;
pub use message::*;
pub use outbox::*;
pub use protocol::*;
pub use registry::*;
pub use timer::*;
