//! Topological nodes.

use std::collections::{BTreeMap, BTreeSet};

use crate::core::GridCoord;
use crate::pathfinding::Path;

/// Small integer node identifier.
pub type NodeId = u32;

/// Reserved id of the not-yet-observed region.
pub const UNEXPLORED_NODE_ID: NodeId = 0;

/// One region of free space around a key point.
#[derive(Clone, Debug, PartialEq)]
pub struct TopologicalNode {
    id: NodeId,
    key_point: GridCoord,
    cell_count: usize,
    borders_unexplored: bool,
    neighbours: BTreeSet<NodeId>,
    paths: BTreeMap<NodeId, Path>,
}

impl TopologicalNode {
    pub fn new(id: NodeId, key_point: GridCoord) -> Self {
        Self {
            id,
            key_point,
            cell_count: 0,
            borders_unexplored: false,
            neighbours: BTreeSet::new(),
            paths: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn key_point(&self) -> GridCoord {
        self.key_point
    }

    /// Number of cells in the region
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cell_count
    }

    /// The region touches unknown space or unassigned free cells.
    #[inline]
    pub fn borders_unexplored(&self) -> bool {
        self.borders_unexplored
    }

    pub fn neighbours(&self) -> &BTreeSet<NodeId> {
        &self.neighbours
    }

    /// Cached key-point-to-key-point path towards a neighbour.
    pub fn path_to(&self, neighbour: NodeId) -> Option<&Path> {
        self.paths.get(&neighbour)
    }

    pub fn paths(&self) -> &BTreeMap<NodeId, Path> {
        &self.paths
    }

    pub(crate) fn add_cell(&mut self) {
        self.cell_count += 1;
    }

    pub(crate) fn mark_borders_unexplored(&mut self) {
        self.borders_unexplored = true;
    }

    pub(crate) fn add_neighbour(&mut self, neighbour: NodeId) {
        if neighbour != self.id {
            self.neighbours.insert(neighbour);
        }
    }

    pub(crate) fn set_path(&mut self, neighbour: NodeId, path: Path) {
        self.paths.insert(neighbour, path);
    }
}
