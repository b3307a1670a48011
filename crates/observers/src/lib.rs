//! Reusable observers for Tether solvers.
//!
//! This crate provides [`Observer`] implementations and capability traits that
//! let one observer work across solvers.
//!
//! # Modules
//!
//! - [`traits`]: capability traits for cross-solver observers
//!   ([`HasResidual`], [`HasObjective`], [`CanStopEarly`])
//!
//! # Features
//!
//! - `plot`: enables [`PlotObserver`] for visualizing solver progress and
//!   optimized trajectories via egui. Adds dependencies on `eframe` and
//!   `egui_plot`.
//!
//! [`Observer`]: tether_core::Observer
//! [`HasResidual`]: traits::HasResidual
//! [`HasObjective`]: traits::HasObjective
//! [`CanStopEarly`]: traits::CanStopEarly

pub mod traits;

#[cfg(feature = "plot")]
mod plot;

#[cfg(feature = "plot")]
pub use plot::{PlotObserver, Plottable, ShowConfig};
