// src/grid/cell.rs
//! Cell actor: sole authority over one coordinate's occupant
//!
//! Each cell runs as its own task and owns its occupant slot outright. Requests
//! arrive on two inboxes (Acquire/Inspect and Leave) and are handled one at a
//! time, so at most one traveler ever holds a Success for the cell.
//!
//! # Arbitration
//!
//! ```text
//! occupant   requester   decision
//! ────────   ─────────   ─────────────────────────────────────────────
//! none       any         admit, Success
//! Normal     any         Fail
//! Wild       Normal      displace wild to a neighbor, admit, Success
//!                        (Fail if no neighbor accepts)
//! Wild       other       Fail
//! Trap       any         forward to the trap, relay its reply
//! ```
//!
//! Displacement makes the cell a client of its neighbors. A neighbor may
//! itself be busy displacing, so two cells can wait on each other forever;
//! travelers bound every attempt with a timer to break such cycles.

use crate::grid::position::Position;
use crate::grid::protocol::{
    CaptureRequest, CellRequest, Identity, Leave, Occupant, OccupantInfo, Relocation, Response,
    TravelerId,
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Cloneable address of a cell actor
#[derive(Debug, Clone)]
pub struct CellHandle {
    position: Position,
    requests: mpsc::Sender<CellRequest>,
    leaves: mpsc::UnboundedSender<Leave>,
}

impl CellHandle {
    pub fn position(&self) -> Position {
        self.position
    }

    /// Ask to occupy this cell and wait for the verdict
    ///
    /// A cell that is no longer running answers Fail.
    pub async fn acquire(&self, requester: Occupant) -> Response {
        let (reply, response) = oneshot::channel();
        if self
            .requests
            .send(CellRequest::Acquire { requester, reply })
            .await
            .is_err()
        {
            return Response::Fail;
        }
        response.await.unwrap_or(Response::Fail)
    }

    /// Vacate this cell; fire-and-forget
    pub fn leave(&self, traveler: TravelerId) {
        let _ = self.leaves.send(Leave { traveler });
    }

    /// Current occupant as seen by the cell actor
    pub async fn occupant(&self) -> Option<OccupantInfo> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(CellRequest::Inspect { reply })
            .await
            .ok()?;
        response.await.ok().flatten()
    }
}

/// Inbox ends owned by a cell actor that has not been spawned yet
pub(crate) struct CellInbox {
    position: Position,
    requests: mpsc::Receiver<CellRequest>,
    leaves: mpsc::UnboundedReceiver<Leave>,
}

/// Create the channels for one cell
pub(crate) fn cell_channel(position: Position, capacity: usize) -> (CellHandle, CellInbox) {
    let (request_tx, request_rx) = mpsc::channel(capacity);
    let (leave_tx, leave_rx) = mpsc::unbounded_channel();

    let handle = CellHandle {
        position,
        requests: request_tx,
        leaves: leave_tx,
    };
    let inbox = CellInbox {
        position,
        requests: request_rx,
        leaves: leave_rx,
    };
    (handle, inbox)
}

/// The running state of one cell
pub(crate) struct CellActor {
    position: Position,
    occupant: Option<Occupant>,

    /// Neighbor cells in displacement search order
    neighbors: Vec<CellHandle>,

    requests: mpsc::Receiver<CellRequest>,
    leaves: mpsc::UnboundedReceiver<Leave>,
}

impl CellActor {
    pub(crate) fn new(inbox: CellInbox, neighbors: Vec<CellHandle>) -> Self {
        Self {
            position: inbox.position,
            occupant: None,
            neighbors,
            requests: inbox.requests,
            leaves: inbox.leaves,
        }
    }

    /// Serve requests until `shutdown` fires
    pub(crate) async fn run(mut self, shutdown: CancellationToken) {
        trace!("Cell {} started", self.position);

        loop {
            // Pending leaves go first so a request never sees a stale occupant.
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(leave) = self.leaves.recv() => self.handle_leave(leave),
                Some(request) = self.requests.recv() => self.handle_request(request).await,
                else => break,
            }
        }

        trace!("Cell {} stopped", self.position);
    }

    async fn handle_request(&mut self, request: CellRequest) {
        match request {
            CellRequest::Acquire { requester, reply } => self.handle_acquire(requester, reply).await,
            CellRequest::Inspect { reply } => {
                let _ = reply.send(self.occupant.as_ref().map(Occupant::info));
            }
        }
    }

    fn handle_leave(&mut self, leave: Leave) {
        match &self.occupant {
            Some(occupant) if occupant.id() == leave.traveler => {
                trace!("Traveler {} left cell {}", leave.traveler, self.position);
                self.occupant = None;
            }
            Some(occupant) => debug!(
                "Ignoring stale leave from traveler {} at cell {} (occupant {})",
                leave.traveler,
                self.position,
                occupant.id()
            ),
            None => trace!(
                "Leave from traveler {} at empty cell {}",
                leave.traveler,
                self.position
            ),
        }
    }

    async fn handle_acquire(&mut self, requester: Occupant, reply: oneshot::Sender<Response>) {
        match self.occupant.clone() {
            None => self.admit(requester, reply),
            Some(Occupant::Normal { .. }) => {
                let _ = reply.send(Response::Fail);
            }
            Some(Occupant::Wild {
                identity,
                relocations,
            }) => match requester {
                Occupant::Normal { .. } => {
                    self.displace(identity, relocations, requester, reply).await
                }
                _ => {
                    let _ = reply.send(Response::Fail);
                }
            },
            Some(Occupant::Trap { identity, captures }) => {
                let response = forward_to_trap(&captures, requester).await;
                trace!(
                    "Trap {} at cell {} answered {:?}",
                    identity.id,
                    self.position,
                    response
                );
                let _ = reply.send(response);
            }
        }
    }

    /// Answer Success and record the requester, unless it stopped waiting
    fn admit(&mut self, requester: Occupant, reply: oneshot::Sender<Response>) {
        let id = requester.id();
        if reply.send(Response::Success).is_ok() {
            self.occupant = Some(requester);
        } else {
            debug!(
                "Traveler {} gave up before cell {} answered, rolling back",
                id, self.position
            );
        }
    }

    /// Move the wild occupant to the first neighbor that does not answer Fail,
    /// then admit the requester in its place
    async fn displace(
        &mut self,
        wild: Identity,
        relocations: mpsc::Sender<Relocation>,
        requester: Occupant,
        reply: oneshot::Sender<Response>,
    ) {
        let occupant = Occupant::Wild {
            identity: wild,
            relocations: relocations.clone(),
        };

        for neighbor in &self.neighbors {
            let response = neighbor.acquire(occupant.clone()).await;
            if response == Response::Fail {
                continue;
            }

            let relocation = Relocation {
                position: neighbor.position(),
                status: response,
            };
            match relocations.try_send(relocation) {
                Ok(()) => {
                    debug!(
                        "Wild traveler {} displaced from {} to {} ({:?})",
                        wild.id,
                        self.position,
                        neighbor.position(),
                        response
                    );
                }
                Err(TrySendError::Closed(_)) => {
                    // Vanishing: it will never learn about the new cell.
                    if response == Response::Success {
                        neighbor.leave(wild.id);
                    }
                    debug!(
                        "Wild traveler {} vanished while being displaced from {}",
                        wild.id, self.position
                    );
                }
                Err(TrySendError::Full(_)) if response == Response::Trapped => {
                    // The trap's own capture notice is what fills the inbox.
                }
                Err(TrySendError::Full(_)) => {
                    neighbor.leave(wild.id);
                    debug!(
                        "Wild traveler {} has a full relocation inbox, keeping it at {}",
                        wild.id, self.position
                    );
                    let _ = reply.send(Response::Fail);
                    return;
                }
            }

            self.occupant = None;
            self.admit(requester, reply);
            return;
        }

        trace!(
            "No neighbor of {} accepts wild traveler {}",
            self.position,
            wild.id
        );
        let _ = reply.send(Response::Fail);
    }
}

/// Hand an Acquire to a trap and wait for its verdict
async fn forward_to_trap(
    captures: &mpsc::Sender<CaptureRequest>,
    requester: Occupant,
) -> Response {
    let (reply, response) = oneshot::channel();
    if captures
        .send(CaptureRequest { requester, reply })
        .await
        .is_err()
    {
        return Response::Fail;
    }
    response.await.unwrap_or(Response::Fail)
}
