//! Session orchestration for the room combat engine.
//!
//! This crate wires the pure [`combat_core::RoomEngine`] into a running
//! room session: a single-writer simulation worker, an mpsc command channel
//! behind a cloneable [`SessionHandle`], a lazy fixed-period tick loop, the
//! asynchronous room-transition round-trip, and the state broadcaster.
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the orchestrator and builder
//! - [`handle`] exposes the command façade clients interact with
//! - [`events`] provides the snapshot watch + discrete event broadcast
//! - [`gateway`] defines the external room-movement collaborator
//! - [`worker`] keeps the background task internal to the crate
pub mod errors;
pub mod events;
pub mod gateway;
pub mod handle;
pub mod rand_roll;
pub mod session;

mod worker;

pub use errors::{Result, SessionError};
pub use events::{SessionEvent, StateBroadcaster};
pub use gateway::{RoomDescriptor, RoomGateway, RoomMoveRequest};
pub use handle::SessionHandle;
pub use rand_roll::EntropyRoller;
pub use session::{Session, SessionBuilder, SessionConfig};
