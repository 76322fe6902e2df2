// src/grid/mod.rs
//! Toroidal grid of cell actors
//!
//! The grid is built once, before any traveler starts, and never resized:
//!
//! - **Position**: wrapping coordinates and directions
//! - **Protocol**: Acquire/Leave/Relocate/Capture message contract
//! - **Cell**: one actor per coordinate, the only writer of its occupant slot
//!
//! # Architecture
//!
//! ```text
//!   Traveler ──Acquire──▶ Cell(x,y) ──Acquire (on behalf of wild)──▶ Cell(x,y±1 | x±1,y)
//!      ▲                     │   │
//!      └──── Response ───────┘   └──Capture──▶ Trap ──Relocate──▶ Wild
//! ```

pub mod cell;
pub mod position;
pub mod protocol;

pub use cell::CellHandle;
pub use position::{Dimensions, Direction, Position};
pub use protocol::{
    CaptureRequest, Identity, Occupant, OccupantInfo, Relocation, Response, TravelerId,
    TravelerKind,
};

use crate::grid::cell::{cell_channel, CellActor};
use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Shared, read-only view of every cell's address
#[derive(Debug, Clone)]
pub struct Grid {
    dims: Dimensions,
    cells: Arc<[CellHandle]>,
    shutdown: CancellationToken,
}

/// Owner of the running cell actor tasks
pub struct GridRuntime {
    grid: Grid,
    tasks: Vec<JoinHandle<()>>,
}

impl Grid {
    /// Spawn one actor per coordinate and return the grid with its task handles
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(dims: Dimensions, inbox_capacity: usize) -> GridRuntime {
        let shutdown = CancellationToken::new();

        let (handles, inboxes): (Vec<_>, Vec<_>) = dims
            .positions()
            .map(|position| cell_channel(position, inbox_capacity))
            .unzip();
        let cells: Arc<[CellHandle]> = handles.into();

        let tasks = dims
            .positions()
            .zip(inboxes)
            .map(|(position, inbox)| {
                // A cell must never ask itself during displacement.
                let neighbors = position
                    .distinct_neighbors(dims)
                    .into_iter()
                    .map(|neighbor| cells[dims.index(neighbor)].clone())
                    .collect();
                let actor = CellActor::new(inbox, neighbors);
                tokio::spawn(actor.run(shutdown.child_token()))
            })
            .collect();

        debug!(
            "Spawned {} cell actors for a {}x{} grid",
            dims.cell_count(),
            dims.width,
            dims.height
        );

        GridRuntime {
            grid: Grid {
                dims,
                cells,
                shutdown,
            },
            tasks,
        }
    }

    pub fn dimensions(&self) -> Dimensions {
        self.dims
    }

    /// Address of the cell at `position`, wrapped onto the board
    pub fn cell(&self, position: Position) -> &CellHandle {
        let wrapped = Position::new(position.x % self.dims.width, position.y % self.dims.height);
        &self.cells[self.dims.index(wrapped)]
    }

    /// Ask every cell for its occupant
    pub async fn occupancy(&self) -> Vec<(Position, Option<OccupantInfo>)> {
        let occupants = join_all(self.cells.iter().map(CellHandle::occupant)).await;
        self.cells
            .iter()
            .map(CellHandle::position)
            .zip(occupants)
            .collect()
    }

    /// Stop every cell actor
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

impl GridRuntime {
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Stop the actors and wait for them to exit
    ///
    /// A cell blocked on a neighbor (a displacement wait-for cycle) cannot
    /// observe the signal, so every task is aborted after cancellation.
    pub async fn shutdown(self) {
        self.grid.shutdown();
        for task in self.tasks {
            task.abort();
            let _ = task.await;
        }
        debug!("Grid shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_grid_starts_empty() {
        let runtime = Grid::spawn(Dimensions::new(4, 3), 8);
        let occupancy = runtime.grid().occupancy().await;

        assert_eq!(occupancy.len(), 12);
        assert!(occupancy.iter().all(|(_, occupant)| occupant.is_none()));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_cell_lookup_wraps() {
        let runtime = Grid::spawn(Dimensions::new(5, 5), 8);
        let grid = runtime.grid();

        assert_eq!(grid.cell(Position::new(2, 3)).position(), Position::new(2, 3));
        assert_eq!(grid.cell(Position::new(7, 5)).position(), Position::new(2, 0));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_cells() {
        let runtime = Grid::spawn(Dimensions::new(2, 2), 8);
        let grid = runtime.grid().clone();
        runtime.shutdown().await;

        let normal = Occupant::Normal {
            identity: Identity::new(0, 'A'),
        };
        assert_eq!(grid.cell(Position::new(0, 0)).acquire(normal).await, Response::Fail);
    }
}
