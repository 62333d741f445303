//! External room-movement collaborator.
//!
//! The engine does not own dungeon topology or persistence; crossing a gate
//! asks this collaborator to perform the room change. Only a confirmed
//! success clears the local roster.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use combat_core::{GateDirection, GateExits, RoomFlags};

/// Outbound room-movement request.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RoomMoveRequest {
    pub direction: GateDirection,
    /// Diagnostic flag forwarded to the collaborator (e.g. to bypass
    /// traversal checks on a debug build).
    pub debug: bool,
}

/// The room the session lands in after a confirmed move.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoomDescriptor {
    pub id: String,
    pub exits: GateExits,
    pub flags: RoomFlags,
}

/// Collaborator performing the actual room change (network round-trip,
/// dungeon graph lookup, persistence — all outside this engine).
///
/// An `Err` covers both transport failure and a rejected move; in either
/// case the caller leaves the combat registry untouched.
#[async_trait]
pub trait RoomGateway: Send + Sync {
    async fn request_move(&self, request: RoomMoveRequest) -> anyhow::Result<RoomDescriptor>;
}
