//! Stateless game systems and the fixed-order solver that runs them once per
//! tick.
//!
//! # Invariants
//! - Systems own no state; everything they read or write lives in the cosmos
//!   or in the step's message queues.
//! - The order of [`standard_solve`] is fixed. Two cosmoi with equal
//!   significant state fed equal entropy stay equal.
//! - Entities queued for destruction are alive until every observer has run
//!   `post_solve`, and children are deleted before their containers.

pub mod inventory;
mod standard_solver;
pub mod systems;
pub mod test_scenes;

#[cfg(test)]
mod testing;

pub use inventory::{TransferResult, perform_transfer, perform_transfers, query_transfer_result};
pub use standard_solver::{
    NoCallbacks, SolveProfile, SolveReport, SolverCallbacks, SolverSettings, solve,
    standard_solve,
};
