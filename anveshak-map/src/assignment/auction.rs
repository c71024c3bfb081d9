//! Greedy frontier auction with lazy exact-utility refinement.
//!
//! Every (bidder, frontier) pair enters a max-heap at its estimate. Popping
//! an estimate triggers a path search and the pair is pushed back at its
//! exact utility. Since estimates bound exact values from above, an exact
//! entry on top of the heap beats everything still queued and is committed.
//!
//! Stale entries are never searched for in the heap; they are skipped when
//! popped (lazy deletion). Equal utilities pop in insertion order.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use super::utility::{RendezvousBudget, estimate_utility, exact_utility};
use crate::core::GridCoord;
use crate::frontier::{Frontier, FrontierId};
use crate::grid::OccupancyGrid;
use crate::pathfinding::{AStarConfig, DEFAULT_ABILITY, Path, plan_path};
use crate::topology::TopologicalMap;

/// Auction configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AuctionConfig {
    /// Frontiers below this area are ignored
    pub min_frontier_area: f64,
    /// Size cap of the interest set
    pub max_frontiers: usize,
    /// Teammates heard from within this many ticks take part
    pub teammate_recency_ticks: u64,
    /// Bid on behalf of teammates
    pub coordinate: bool,
}

impl Default for AuctionConfig {
    fn default() -> Self {
        Self {
            min_frontier_area: 3.0,
            max_frontiers: 15,
            teammate_recency_ticks: 10,
            coordinate: true,
        }
    }
}

/// One participant in the auction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bidder {
    pub agent_id: usize,
    pub position: GridCoord,
    pub ability: u8,
}

impl Bidder {
    pub fn new(agent_id: usize, position: GridCoord) -> Self {
        Self {
            agent_id,
            position,
            ability: DEFAULT_ABILITY,
        }
    }
}

/// A committed (agent, frontier) pair.
#[derive(Clone, Debug)]
pub struct Assignment {
    pub agent_id: usize,
    pub frontier: FrontierId,
    /// Index into the frontier slice the auction ran over
    pub frontier_index: usize,
    pub utility: f64,
    /// Path from the agent to the frontier's closest point
    pub path: Path,
}

/// Outcome of one agent's auction round.
#[derive(Clone, Debug, Default)]
pub struct AuctionResult {
    /// The acting agent's frontier, `None` when nothing is reachable
    pub assignment: Option<Assignment>,
    /// Frontiers the acting agent expects teammates to take
    pub teammate_assignments: Vec<Assignment>,
}

#[derive(Debug)]
struct Bid {
    utility: f64,
    seq: u64,
    bidder: usize,
    frontier: usize,
    path: Option<Path>,
}

impl Bid {
    fn is_exact(&self) -> bool {
        self.path.is_some()
    }
}

impl PartialEq for Bid {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Bid {}

impl Ord for Bid {
    fn cmp(&self, other: &Self) -> Ordering {
        self.utility
            .partial_cmp(&other.utility)
            .unwrap_or(Ordering::Equal)
            // earlier insertion wins ties
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Bid {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Shared inputs of an auction over one agent's map.
pub struct FrontierAuction<'a> {
    grid: &'a OccupancyGrid,
    topology: Option<&'a TopologicalMap>,
    astar: &'a AStarConfig,
    config: &'a AuctionConfig,
    frontiers: &'a [Frontier],
    budget: Option<RendezvousBudget>,
}

impl<'a> FrontierAuction<'a> {
    pub fn new(
        grid: &'a OccupancyGrid,
        frontiers: &'a [Frontier],
        astar: &'a AStarConfig,
        config: &'a AuctionConfig,
    ) -> Self {
        Self {
            grid,
            topology: None,
            astar,
            config,
            frontiers,
            budget: None,
        }
    }

    /// Plan exact paths through the topological graph.
    pub fn with_topology(mut self, topology: &'a TopologicalMap) -> Self {
        self.topology = Some(topology);
        self
    }

    /// Penalise frontiers that break the acting agent's rendezvous deadline.
    pub fn with_budget(mut self, budget: Option<RendezvousBudget>) -> Self {
        self.budget = budget;
        self
    }

    fn plan(&self, bidder: &Bidder, goal: GridCoord) -> Path {
        plan_path(
            self.grid,
            self.topology,
            bidder.position,
            goal,
            self.astar,
            bidder.ability,
        )
    }

    /// Indices of the frontiers worth bidding on, best estimate first.
    ///
    /// Frontiers unreachable from `base` are added to `blacklist`. The
    /// previous target is kept even when it falls outside the cap.
    pub fn interest_set(
        &self,
        acting: &Bidder,
        base: Option<GridCoord>,
        previous_target: Option<FrontierId>,
        blacklist: &mut HashSet<FrontierId>,
    ) -> Vec<usize> {
        let mut candidates: Vec<(usize, f64)> = self
            .frontiers
            .iter()
            .enumerate()
            .filter(|(_, f)| f.area() >= self.config.min_frontier_area)
            .filter(|(_, f)| !blacklist.contains(&f.id()))
            .filter(|(_, f)| f.has_unknown_boundary(self.grid))
            .map(|(i, f)| (i, estimate_utility(f.area(), acting.position, f.centre())))
            .collect();
        candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        let mut selected = Vec::new();
        for (idx, _) in candidates {
            if selected.len() >= self.config.max_frontiers {
                break;
            }
            let frontier = &self.frontiers[idx];
            if let Some(base) = base {
                if !self.reachable_from(base, frontier) {
                    debug!(
                        "[Auction] agent {}: frontier {} unreachable from base, blacklisted",
                        acting.agent_id,
                        frontier.centre()
                    );
                    blacklist.insert(frontier.id());
                    continue;
                }
            }
            selected.push(idx);
        }

        if let Some(target) = previous_target {
            let retained = self
                .frontiers
                .iter()
                .position(|f| f.id() == target)
                .filter(|idx| !selected.contains(idx) && !blacklist.contains(&target));
            if let Some(idx) = retained {
                trace!("[Auction] retaining previous target {}", target.centre);
                selected.push(idx);
            }
        }

        selected
    }

    fn reachable_from(&self, base: GridCoord, frontier: &Frontier) -> bool {
        let Some(goal) = frontier.closest_point(base, self.grid) else {
            return false;
        };
        let bidder = Bidder {
            agent_id: usize::MAX,
            position: base,
            ability: DEFAULT_ABILITY,
        };
        self.plan(&bidder, goal).found()
    }

    /// Run the auction for `acting`, bidding for `teammates` too.
    ///
    /// Frontiers the acting agent cannot reach are added to `blacklist`.
    pub fn run(
        &self,
        acting: &Bidder,
        teammates: &[Bidder],
        interest: &[usize],
        blacklist: &mut HashSet<FrontierId>,
    ) -> AuctionResult {
        let mut bidders = Vec::with_capacity(teammates.len() + 1);
        bidders.push(*acting);
        bidders.extend_from_slice(teammates);

        let mut result = AuctionResult::default();
        let committed = self.auction(&bidders, interest, Some(0), Some(blacklist));
        for assignment in committed {
            if assignment.agent_id == acting.agent_id {
                result.assignment = Some(assignment);
            } else {
                result.teammate_assignments.push(assignment);
            }
        }

        match &result.assignment {
            Some(a) => debug!(
                "[Auction] agent {} -> frontier {} (utility {:.3e}), {} teammate assignments",
                acting.agent_id,
                a.frontier.centre,
                a.utility,
                result.teammate_assignments.len()
            ),
            None => debug!(
                "[Auction] agent {}: no reachable frontier",
                acting.agent_id
            ),
        }
        result
    }

    /// Run the auction to completion for every bidder.
    pub fn assign_all(&self, bidders: &[Bidder], interest: &[usize]) -> Vec<Assignment> {
        self.auction(bidders, interest, None, None)
    }

    fn auction(
        &self,
        bidders: &[Bidder],
        interest: &[usize],
        acting: Option<usize>,
        mut blacklist: Option<&mut HashSet<FrontierId>>,
    ) -> Vec<Assignment> {
        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        for (b, bidder) in bidders.iter().enumerate() {
            for &f in interest {
                let frontier = &self.frontiers[f];
                heap.push(Bid {
                    utility: estimate_utility(frontier.area(), bidder.position, frontier.centre()),
                    seq,
                    bidder: b,
                    frontier: f,
                    path: None,
                });
                seq += 1;
            }
        }

        let mut removed_bidders: HashSet<usize> = HashSet::new();
        let mut removed_frontiers: HashSet<usize> = HashSet::new();
        let mut dropped_pairs: HashSet<(usize, usize)> = HashSet::new();
        let mut committed = Vec::new();
        let mut searches = 0usize;

        while let Some(bid) = heap.pop() {
            if removed_bidders.contains(&bid.bidder)
                || removed_frontiers.contains(&bid.frontier)
                || dropped_pairs.contains(&(bid.bidder, bid.frontier))
            {
                continue;
            }

            let bidder = &bidders[bid.bidder];
            let frontier = &self.frontiers[bid.frontier];
            let is_acting = acting == Some(bid.bidder);

            if !bid.is_exact() {
                searches += 1;
                let path = frontier
                    .closest_point(bidder.position, self.grid)
                    .map(|goal| self.plan(bidder, goal))
                    .filter(|path| path.found());

                let Some(path) = path else {
                    if is_acting {
                        if let Some(blacklist) = blacklist.as_deref_mut() {
                            blacklist.insert(frontier.id());
                        }
                        removed_frontiers.insert(bid.frontier);
                        debug!(
                            "[Auction] agent {}: no path to frontier {}, blacklisted",
                            bidder.agent_id,
                            frontier.centre()
                        );
                    } else {
                        dropped_pairs.insert((bid.bidder, bid.frontier));
                    }
                    continue;
                };

                let closest = path.goal_point().unwrap_or(frontier.centre());
                let budget = if is_acting { self.budget.as_ref() } else { None };
                let utility = exact_utility(
                    frontier.area(),
                    bidder.position,
                    closest,
                    frontier.centre(),
                    path.length(),
                    budget,
                );
                heap.push(Bid {
                    utility,
                    seq,
                    bidder: bid.bidder,
                    frontier: bid.frontier,
                    path: Some(path),
                });
                seq += 1;
                continue;
            }

            let assignment = Assignment {
                agent_id: bidder.agent_id,
                frontier: frontier.id(),
                frontier_index: bid.frontier,
                utility: bid.utility,
                path: bid.path.unwrap_or_default(),
            };
            trace!(
                "[Auction] commit agent {} -> frontier {} ({:.3e})",
                assignment.agent_id,
                frontier.centre(),
                assignment.utility
            );
            committed.push(assignment);

            if is_acting {
                break;
            }
            removed_bidders.insert(bid.bidder);
            removed_frontiers.insert(bid.frontier);
        }

        trace!(
            "[Auction] {} bidders, {} frontiers, {} path searches, {} commits",
            bidders.len(),
            interest.len(),
            searches,
            committed.len()
        );
        committed
    }
}
