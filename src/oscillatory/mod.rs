//! Oscillatory neural networks: Kuramoto phase-coupled synchronization
//! (`sync`, the spatial-clustering variant `syncnet`, and the hierarchical
//! `hsyncnet`), plus the grid-oscillator consumers `pcnn` and `legion`.

pub mod hsyncnet;
pub mod legion;
pub mod pcnn;
pub mod sync;
pub mod syncnet;

pub use sync::{InitialType, SolverType, SyncDynamic, SyncNetwork, SyncNetworkState};
