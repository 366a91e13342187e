//! Forest of labeled nodes with cycle-free re-parenting.
//!
//! Nodes live in a [`NodeStore`](infrastructure::NodeStore) and refer to each
//! other by [`NodeId`](domain::NodeId). Every mutation goes through
//! [`ForestService`](application::services::ForestService), which runs the
//! reparenting engine inside a single store transaction so that heights,
//! roots and parent/child links are never observed half-updated.

pub mod application;
pub mod cli;
pub mod config;
pub mod domain;
pub mod exitcode;
pub mod infrastructure;
pub mod util;
