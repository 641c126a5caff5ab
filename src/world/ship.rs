//! Ships and their tick-driven voyages

use serde::{Deserialize, Serialize};

use crate::core::types::{Coord, ShipId};
use crate::world::stock::Stock;

/// Tiles covered per tick while sailing
const SAIL_SPEED: u32 = 4;

/// An in-progress voyage to a destination tile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voyage {
    pub destination: Coord,
    pub eta: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub id: ShipId,
    pub position: Coord,
    pub cargo: Stock,
    voyage: Option<Voyage>,
    /// Set by the transport layer when the path cannot be continued;
    /// missions observing this must abort and release the ship
    pub blocked: bool,
}

impl Ship {
    pub fn new(id: ShipId, position: Coord) -> Self {
        Self {
            id,
            position,
            cargo: Stock::new(),
            voyage: None,
            blocked: false,
        }
    }

    /// Begin sailing toward a destination
    pub fn sail_to(&mut self, destination: Coord) {
        let distance = self.position.manhattan_distance(destination);
        self.voyage = Some(Voyage {
            destination,
            eta: distance.div_ceil(SAIL_SPEED).max(1),
        });
    }

    pub fn is_sailing(&self) -> bool {
        self.voyage.is_some()
    }

    pub fn has_arrived_at(&self, destination: Coord) -> bool {
        self.voyage.is_none() && self.position == destination
    }

    /// Advance the voyage by one tick
    pub fn advance(&mut self) {
        if self.blocked {
            return;
        }
        if let Some(voyage) = &mut self.voyage {
            voyage.eta -= 1;
            if voyage.eta == 0 {
                self.position = voyage.destination;
                self.voyage = None;
            }
        }
    }

    /// Abort whatever the ship was doing (mission failure path)
    pub fn abort_voyage(&mut self) {
        self.voyage = None;
        self.blocked = false;
    }
}
