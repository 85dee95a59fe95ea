//! # canopy-core
//!
//! Client-side model of a cloned note tree: the same note can live under
//! many parents, so the hierarchy is a DAG viewed as a tree. This crate
//! keeps a local entity cache in sync with a server over push messages and
//! drives a lazy tree-view model from it.
//!
//! ## Overview
//!
//! A note's position is addressed by a **note path** (`root/a/b/c`), the
//! note-id chain from the root sentinel down to the note. Paths come from
//! the address bar and from stored links, so they go stale whenever notes
//! move; [`paths::resolve_run_path`] verifies every hop against the cache
//! and splices in a real placement when a hop no longer holds, preferring a
//! repaired view over a hard failure.
//!
//! ## Architecture
//!
//! - **[`cache`]**: entity cache of notes and branch edges, adjacency both
//!   directions, first-parent ordering
//! - **[`paths`]**: note-path type plus resolution and repair
//! - **[`view`]**: visual tree model, one node per (note, parent) edge,
//!   lazily materialized subtrees
//! - **[`controller`]**: orchestration of cache, view and transport;
//!   navigation, mutations, keyboard dispatch
//! - **[`transport`]**: async server contract and wire DTOs
//! - **[`event`]**: pushed server messages and navigation I/O
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use canopy_core::{
//!     config::TreeConfig,
//!     controller::TreeController,
//!     event::NavigationRequest,
//!     transport::Transport,
//! };
//! use std::sync::Arc;
//!
//! # async fn example(transport: Arc<dyn Transport>) -> Result<(), canopy_core::CanopyError> {
//! let (controller, mut nav_rx) = TreeController::new(transport, TreeConfig::default());
//! controller.load(NavigationRequest::Load { fragment: None }).await?;
//! while let Some(result) = nav_rx.recv().await {
//!     println!("{result:?}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod event;
pub mod paths;
pub mod properties;
#[cfg(test)]
mod tests;
pub mod transport;
pub mod view;

pub use error::*;
