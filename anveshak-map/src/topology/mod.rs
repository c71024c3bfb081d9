//! Topological decomposition of free space.
//!
//! Free space is thinned to a one-pixel skeleton, key points are picked on
//! the skeleton (junctions plus gap fillers), and the free cells are grown
//! into one region per key point. Regions become [`TopologicalNode`]s with
//! adjacency and cached key-point-to-key-point paths, which the hierarchical
//! planner searches instead of the raw grid.
//!
//! ```text
//!   free space        skeleton          regions
//!   ##########        ##########        ##########
//!   #........#        #........#        #11112222#
//!   #........#   ->   #.******.#   ->   #11112222#
//!   #........#        #........#        #11112222#
//!   ##########        ##########        ##########
//! ```
//!
//! Rebuilds are lazy: [`TopologicalMap::update`] only recomputes when
//! forced or when enough cells turned from unknown to free since the last
//! build.

mod areas;
mod cache;
mod keypoints;
mod map;
mod node;
mod skeleton;

pub use areas::{AreaGrid, fill_key_areas};
pub use cache::{DEFAULT_PATH_CACHE_CAPACITY, PathCache};
pub use keypoints::{KeyPointConfig, find_key_points};
pub use map::{TopologicalMap, TopologyConfig};
pub use node::{NodeId, TopologicalNode, UNEXPLORED_NODE_ID};
pub use skeleton::{HopSearch, Mask, skeleton_hop_distance, skeleton_reachable, skeletonize};
