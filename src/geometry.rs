//! Point and dataset primitives, and the distance metrics algorithms are
//! built on.
//!
//! Unlike the const-generic [`nalgebra::DimName`]-indexed points this crate's
//! ancestor used for mesh coordinates, clustering dimensionality is only
//! known at run time (it comes from whatever dataset the caller loads), so
//! [`Point`] is a thin newtype over `Vec<f64>` instead. Value equality and
//! hashing go through [`ordered_float::OrderedFloat`], the same crate used
//! elsewhere in the corpus to give bare `f64` coordinates a total order.

use ordered_float::OrderedFloat;
use std::ops::{Add, Index, IndexMut, Sub};

use crate::error::{CoreError, Result};

/// A point in ℝᵈ, `d` fixed at construction but not known to the type system.
#[derive(Debug, Clone, PartialEq)]
pub struct Point(Vec<f64>);

impl Point {
    pub fn new(coords: Vec<f64>) -> Self {
        Point(coords)
    }

    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

impl Eq for Point {}

impl std::hash::Hash for Point {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for c in &self.0 {
            OrderedFloat(*c).hash(state);
        }
    }
}

impl Index<usize> for Point {
    type Output = f64;
    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

impl IndexMut<usize> for Point {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        &mut self.0[i]
    }
}

impl<'a> Add<&'a Point> for &'a Point {
    type Output = Point;
    fn add(self, rhs: &'a Point) -> Point {
        Point(self.0.iter().zip(&rhs.0).map(|(a, b)| a + b).collect())
    }
}

impl<'a> Sub<&'a Point> for &'a Point {
    type Output = Point;
    fn sub(self, rhs: &'a Point) -> Point {
        Point(self.0.iter().zip(&rhs.0).map(|(a, b)| a - b).collect())
    }
}

impl From<Vec<f64>> for Point {
    fn from(v: Vec<f64>) -> Self {
        Point(v)
    }
}

/// An ordered collection of points, all of equal dimension.
#[derive(Debug, Clone)]
pub struct Dataset {
    points: Vec<Point>,
    dim: usize,
}

impl Dataset {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        let dim = points
            .first()
            .ok_or_else(|| CoreError::InvalidParameter("dataset must be non-empty".into()))?
            .dim();
        for p in &points {
            if p.dim() != dim {
                return Err(CoreError::DimensionMismatch {
                    expected: dim,
                    actual: p.dim(),
                });
            }
        }
        Ok(Dataset { points, dim })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn get(&self, i: usize) -> &Point {
        &self.points[i]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.points.iter()
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.points
    }
}

/// A pluggable dissimilarity between two points, as used by k-medoids and by
/// callers of the generic clusterers that don't want plain Euclidean.
pub type Metric = fn(&Point, &Point) -> f64;

pub fn euclidean_distance_squared(a: &Point, b: &Point) -> f64 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y) * (x - y))
        .sum()
}

pub fn euclidean_distance(a: &Point, b: &Point) -> f64 {
    euclidean_distance_squared(a, b).sqrt()
}

pub fn manhattan_distance(a: &Point, b: &Point) -> f64 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y).abs())
        .sum()
}

pub fn chebyshev_distance(a: &Point, b: &Point) -> f64 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

pub fn minkowski_distance(a: &Point, b: &Point, p: f64) -> f64 {
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| (x - y).abs().powf(p))
        .sum::<f64>()
        .powf(1.0 / p)
}

/// The size-weighted centroid of two points, `weight` is `size1 / (size1 + size2)`.
pub fn weighted_midpoint(a: &Point, b: &Point, weight: f64) -> Point {
    Point(
        a.as_slice()
            .iter()
            .zip(b.as_slice())
            .map(|(x, y)| x * weight + y * (1.0 - weight))
            .collect(),
    )
}

/// The plain arithmetic mean of a set of points, all assumed of equal dimension.
pub fn mean(points: &[&Point]) -> Point {
    let dim = points[0].dim();
    let mut total = vec![0.0; dim];
    for p in points {
        for (t, c) in total.iter_mut().zip(p.as_slice()) {
            *t += c;
        }
    }
    let n = points.len() as f64;
    for t in total.iter_mut() {
        *t /= n;
    }
    Point(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_matches_pythagoras() {
        let a = Point::new(vec![0.0, 0.0]);
        let b = Point::new(vec![3.0, 4.0]);
        assert_eq!(euclidean_distance(&a, &b), 5.0);
    }

    #[test]
    fn dataset_rejects_mismatched_dimension() {
        let points = vec![Point::new(vec![0.0, 0.0]), Point::new(vec![1.0, 1.0, 1.0])];
        assert!(Dataset::new(points).is_err());
    }

    #[test]
    fn mean_is_componentwise_average() {
        let a = Point::new(vec![0.0, 0.0]);
        let b = Point::new(vec![2.0, 4.0]);
        let m = mean(&[&a, &b]);
        assert_eq!(m.as_slice(), &[1.0, 2.0]);
    }
}
