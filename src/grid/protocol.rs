// src/grid/protocol.rs
//! Request/response contract between travelers and cell actors

use crate::grid::position::Position;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

/// Traveler identifier, unique within one simulation
pub type TravelerId = usize;

/// Outcome of an Acquire, also used as a traveler's terminal status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    /// No outcome yet
    Pending,
    Success,
    Fail,
    Trapped,
    Deadlocked,
}

/// Stable identity of a traveler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub id: TravelerId,
    pub symbol: char,
}

impl Identity {
    pub const fn new(id: TravelerId, symbol: char) -> Self {
        Self { id, symbol }
    }
}

/// Traveler variant, without its channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelerKind {
    Normal,
    Wild,
    Trap,
}

/// Forced move pushed onto a wild traveler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relocation {
    pub position: Position,
    pub status: Response,
}

/// Acquire forwarded by a trap-occupied cell to the trap itself
#[derive(Debug)]
pub struct CaptureRequest {
    pub requester: Occupant,
    pub reply: oneshot::Sender<Response>,
}

/// A requester or occupant, carrying the inboxes the protocol needs to reach it
#[derive(Debug, Clone)]
pub enum Occupant {
    Normal {
        identity: Identity,
    },
    Wild {
        identity: Identity,
        relocations: mpsc::Sender<Relocation>,
    },
    Trap {
        identity: Identity,
        captures: mpsc::Sender<CaptureRequest>,
    },
}

impl Occupant {
    pub fn identity(&self) -> Identity {
        match self {
            Occupant::Normal { identity }
            | Occupant::Wild { identity, .. }
            | Occupant::Trap { identity, .. } => *identity,
        }
    }

    pub fn id(&self) -> TravelerId {
        self.identity().id
    }

    pub fn kind(&self) -> TravelerKind {
        match self {
            Occupant::Normal { .. } => TravelerKind::Normal,
            Occupant::Wild { .. } => TravelerKind::Wild,
            Occupant::Trap { .. } => TravelerKind::Trap,
        }
    }

    pub fn info(&self) -> OccupantInfo {
        OccupantInfo {
            id: self.id(),
            kind: self.kind(),
        }
    }
}

/// Snapshot of a cell's occupant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantInfo {
    pub id: TravelerId,
    pub kind: TravelerKind,
}

/// Messages on a cell's request inbox
#[derive(Debug)]
pub enum CellRequest {
    Acquire {
        requester: Occupant,
        reply: oneshot::Sender<Response>,
    },
    Inspect {
        reply: oneshot::Sender<Option<OccupantInfo>>,
    },
}

/// Vacating notice; carries the leaver so a stale notice cannot evict a newer occupant
#[derive(Debug, Clone, Copy)]
pub struct Leave {
    pub traveler: TravelerId,
}
