//! Frontier assignment.
//!
//! Agents bid on frontiers by utility, a measure of how much unknown area
//! a frontier promises per unit of travel. Cheap straight-line estimates
//! order the auction and exact path-based utilities are only computed for
//! pairs that reach the top of the queue.

mod auction;
mod utility;

pub use auction::{Assignment, AuctionConfig, AuctionResult, Bidder, FrontierAuction};
pub use utility::{
    BUDGET_PENALTY, ON_CENTRE_UTILITY, RendezvousBudget, UTILITY_SCALE, estimate_utility,
    exact_utility,
};
