//! Property-based tests over the partition invariants every plain
//! `Clusterer` must uphold, and over the kd-tree's insert/remove structural
//! invariants.

use proptest::prelude::*;

use clusterfield::clusterers::agglomerative::{Agglomerative, AgglomerativeSettings, Linkage};
use clusterfield::clusterers::hierarchical::{Hierarchical, HierarchicalSettings};
use clusterfield::clusterers::kmedoids::{KMedoids, KMedoidsSettings};
use clusterfield::{Clusterer, Dataset, KdTree, Point};

fn arb_dataset(min_points: usize, max_points: usize, dim: usize) -> impl Strategy<Value = Dataset> {
    proptest::collection::vec(proptest::collection::vec(-100.0_f64..100.0, dim), min_points..=max_points)
        .prop_map(|coords| Dataset::new(coords.into_iter().map(Point::new).collect()).unwrap())
}

/// Every plain clusterer's output must be a partition of `0..dataset.len()`:
/// every index appears in exactly one cluster, and no cluster is empty.
fn assert_is_partition(clusters: &[Vec<usize>], n: usize) {
    let mut seen = vec![false; n];
    for cluster in clusters {
        assert!(!cluster.is_empty(), "clusterer produced an empty cluster");
        for &i in cluster {
            assert!(i < n, "index {i} out of range for {n} points");
            assert!(!seen[i], "point {i} assigned to more than one cluster");
            seen[i] = true;
        }
    }
    assert!(seen.iter().all(|&s| s), "some point was never assigned to a cluster");
}

proptest! {
    #[test]
    fn agglomerative_always_partitions(dataset in arb_dataset(2, 20, 2), k in 1usize..6) {
        let _ = tracing_subscriber::fmt::try_init();
        let dataset_len = dataset.len();
        let k = k.min(dataset_len);
        for linkage in [Linkage::Single, Linkage::Complete, Linkage::Average, Linkage::Centroid] {
            let mut agg = Agglomerative::new(AgglomerativeSettings { number_clusters: k, linkage });
            let clusters = agg.process(&dataset).unwrap();
            assert_eq!(clusters.len(), k);
            assert_is_partition(&clusters, dataset_len);
        }
    }

    #[test]
    fn hierarchical_always_partitions(dataset in arb_dataset(2, 20, 3), k in 1usize..6) {
        let dataset_len = dataset.len();
        let k = k.min(dataset_len);
        let mut h = Hierarchical::new(HierarchicalSettings { number_clusters: k });
        let clusters = h.process(&dataset).unwrap();
        assert_eq!(clusters.len(), k);
        assert_is_partition(&clusters, dataset_len);
    }

    #[test]
    fn kmedoids_always_partitions(dataset in arb_dataset(3, 20, 2), seed_count in 1usize..4) {
        let dataset_len = dataset.len();
        let seed_count = seed_count.min(dataset_len);
        let seeds: Vec<usize> = (0..seed_count).collect();
        let mut kmedoids = KMedoids::new(seeds, KMedoidsSettings::default()).unwrap();
        let clusters = kmedoids.process(&dataset).unwrap();
        assert_is_partition(&clusters, dataset_len);
    }

    /// Every point inserted into a kd-tree is found by an exact-match query
    /// until it is removed, and never again afterward.
    #[test]
    fn kdtree_insert_then_remove_round_trips(
        coords in proptest::collection::vec(proptest::collection::vec(-50.0_f64..50.0, 2), 1..30)
    ) {
        let mut tree: KdTree<usize> = KdTree::new(2);
        let points: Vec<Point> = coords.into_iter().map(Point::new).collect();

        for (i, p) in points.iter().enumerate() {
            tree.insert(p.clone(), i).unwrap();
        }
        for (i, p) in points.iter().enumerate() {
            prop_assert!(tree.find_node(p, Some(i)).is_some());
        }

        for (i, p) in points.iter().enumerate() {
            tree.remove(p, i);
            prop_assert!(tree.find_node(p, Some(i)).is_none());
        }
        prop_assert!(tree.is_empty());
    }

    /// A range search around a query point returns exactly the points within
    /// `radius` (by direct Euclidean distance), no more and no fewer.
    #[test]
    fn kdtree_range_search_matches_brute_force(
        coords in proptest::collection::vec(proptest::collection::vec(-20.0_f64..20.0, 2), 1..25),
        radius in 0.5_f64..15.0,
    ) {
        let mut tree: KdTree<usize> = KdTree::new(2);
        let points: Vec<Point> = coords.into_iter().map(Point::new).collect();
        for (i, p) in points.iter().enumerate() {
            tree.insert(p.clone(), i).unwrap();
        }

        let query = points[0].clone();
        let found: std::collections::HashSet<usize> = tree
            .find_nearest_within(&query, radius)
            .into_iter()
            .map(|(node, _)| tree.payload(node))
            .collect();

        let expected: std::collections::HashSet<usize> = points
            .iter()
            .enumerate()
            .filter(|(_, p)| clusterfield::geometry::euclidean_distance(&query, p) <= radius)
            .map(|(i, _)| i)
            .collect();

        prop_assert_eq!(found, expected);
    }
}
