//! A library of cluster-analysis and oscillatory-neural-network algorithms
//! operating on point sets in ℝᵈ.
//!
//! # Crate layout
//!
//! - [`geometry`] — the `Point`/`Dataset` primitives and pluggable distance
//!   metrics every algorithm below is built on.
//! - [`kdtree`] — a kd-tree (insert/remove/range and nearest-neighbor search)
//!   used internally by [`Cure`] and available to any caller needing
//!   nearest-neighbor queries over a point set.
//! - [`ode`] — fixed-step Runge-Kutta 4 and adaptive Runge-Kutta-Fehlberg
//!   4(5) integration, shared by every oscillatory network.
//! - [`topology`] — the adjacency substrate (`None`, `AllToAll`, grid, list,
//!   `Dynamic`) oscillator networks are built over.
//! - [`oscillatory`] — the Kuramoto phase-coupled network family
//!   ([`SyncNetwork`], [`SyncNet`], `hsyncnet::process`), plus the
//!   grid-oscillator consumers `pcnn` and `legion`.
//! - [`cure`] — [`Cure`], hierarchical clustering via representative points
//!   and shrinkage.
//! - [`clusterers`] — k-means, k-medians, k-medoids, agglomerative (four
//!   linkages), the dedicated centroid hierarchical clusterer, DBSCAN, ROCK,
//!   and x-means.
//!
//! # Available algorithms
//!
//! ## Oscillatory clustering
//! - [`SyncNetwork`]: the base Kuramoto phase-coupled network.
//! - [`SyncNet`]: spatial clustering via Kuramoto synchronization.
//! - [`oscillatory::hsyncnet::process`]: hierarchical SyncNet with automatic
//!   radius growth.
//!
//! ## Partitional and hierarchical clustering
//! - [`Cure`]: representative-point clustering robust to non-spherical shapes.
//! - [`clusterers::kmeans::KMeans`], [`clusterers::kmedians::KMedians`],
//!   [`clusterers::kmedoids::KMedoids`]: center-based partitioning.
//! - [`clusterers::agglomerative::Agglomerative`],
//!   [`clusterers::hierarchical::Hierarchical`]: merge-based partitioning.
//! - [`clusterers::dbscan::Dbscan`]: density-based clustering with noise.
//! - [`clusterers::rock::Rock`]: link-based clustering for categorical data.
//! - [`clusterers::xmeans::XMeans`]: k-means with BIC/MNDL structure discovery.
//!
//! Every fallible constructor and `process` entry point returns
//! [`Result<T, CoreError>`]; see [`error`] for the full failure taxonomy.
//! Oscillatory networks additionally carry an advisory, non-fatal `stalled`
//! flag on their trajectory result rather than raising when an adaptive
//! integration or a dynamic-order run hits its iteration cap.

pub mod clusterers;
pub mod cure;
pub mod error;
pub mod geometry;
pub mod kdtree;
pub mod ode;
pub mod oscillatory;
pub mod topology;

pub use clusterers::{
    agglomerative::{Agglomerative, AgglomerativeSettings, Linkage},
    dbscan::{Dbscan, DbscanResult, DbscanSettings},
    hierarchical::{Hierarchical, HierarchicalSettings},
    kmeans::{KMeans, KMeansSettings},
    kmedians::{KMedians, KMediansSettings},
    kmedoids::{KMedoids, KMedoidsSettings},
    rock::{Rock, RockSettings},
    xmeans::{SplittingCriterion, XMeans, XMeansSettings},
    ClusterSequence, Clusterer,
};
pub use cure::{Cure, CureClusterId, CureSettings};
pub use error::{CoreError, Result};
pub use geometry::{Dataset, Metric, Point};
pub use kdtree::{KdTree, NodeRef};
pub use ode::{DifferState, IntegrationResult, TrajectoryPoint};
pub use oscillatory::{
    legion::{Legion, LegionSettings},
    pcnn::{Pcnn, PcnnSettings},
    syncnet::{SyncNet, SyncNetSettings},
    InitialType, SolverType, SyncDynamic, SyncNetwork, SyncNetworkState,
};
pub use topology::{Topology, TopologyKind};
