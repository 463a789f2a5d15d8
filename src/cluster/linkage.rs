//! Complete-linkage agglomerative clustering with Euclidean distance.
//!
//! Uses the nearest-neighbor chain algorithm, O(n²) time and memory, and
//! emits merges in the same layout and labelling as SciPy's `linkage`:
//! leaves are `0..n`, the i-th merge creates cluster `n + i`, and each merge
//! lists the smaller child id first.

use crate::error::{MetaboError, Result};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// One agglomeration step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Merge {
    /// Smaller child cluster id.
    pub left: usize,
    /// Larger child cluster id.
    pub right: usize,
    /// Complete-linkage distance between the children.
    pub distance: f64,
    /// Number of leaves under the new cluster.
    pub size: usize,
}

/// A full merge tree over `n_leaves` observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Linkage {
    n_leaves: usize,
    merges: Vec<Merge>,
}

impl Linkage {
    /// Number of clustered observations.
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Merges in order of non-decreasing distance.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Id of the root cluster.
    pub fn root(&self) -> usize {
        2 * self.n_leaves - 2
    }

    /// Children of an internal cluster id, `None` for leaves.
    pub fn children(&self, cluster: usize) -> Option<(usize, usize)> {
        cluster
            .checked_sub(self.n_leaves)
            .and_then(|i| self.merges.get(i))
            .map(|m| (m.left, m.right))
    }

    /// Height of a cluster: 0 for leaves, merge distance otherwise.
    pub fn height(&self, cluster: usize) -> f64 {
        cluster
            .checked_sub(self.n_leaves)
            .and_then(|i| self.merges.get(i))
            .map(|m| m.distance)
            .unwrap_or(0.0)
    }

    /// Left-to-right leaf order of the dendrogram, left child first.
    pub fn leaf_order(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.n_leaves);
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            match self.children(node) {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => order.push(node),
            }
        }
        order
    }

    /// SciPy-style `(n - 1) × 4` rows: left, right, distance, size.
    pub fn to_rows(&self) -> Vec<[f64; 4]> {
        self.merges
            .iter()
            .map(|m| [m.left as f64, m.right as f64, m.distance, m.size as f64])
            .collect()
    }
}

/// Index into a condensed distance vector, `i != j`.
#[inline]
fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    let (i, j) = if i < j { (i, j) } else { (j, i) };
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Pairwise Euclidean distances between the rows of `observations`, condensed.
pub fn pairwise_euclidean(observations: &DMatrix<f64>) -> Vec<f64> {
    let n = observations.nrows();
    (0..n)
        .into_par_iter()
        .flat_map_iter(|i| {
            (i + 1..n).map(move |j| (observations.row(i) - observations.row(j)).norm())
        })
        .collect()
}

/// Complete-linkage clustering of the rows of `observations`.
///
/// Requires at least two rows and only finite values.
pub fn linkage_complete(observations: &DMatrix<f64>) -> Result<Linkage> {
    let n = observations.nrows();
    if n < 2 {
        return Err(MetaboError::InvalidParameter(format!(
            "Clustering needs at least 2 observations, got {}",
            n
        )));
    }
    if observations.iter().any(|v| !v.is_finite()) {
        return Err(MetaboError::InvalidParameter(
            "Clustering input contains missing or infinite values".to_string(),
        ));
    }

    let mut dist = pairwise_euclidean(observations);
    let mut size = vec![1usize; n];
    let mut chain: Vec<usize> = Vec::with_capacity(n);
    let mut merges = Vec::with_capacity(n - 1);

    for _ in 0..n - 1 {
        if chain.is_empty() {
            if let Some(first) = size.iter().position(|&s| s > 0) {
                chain.push(first);
            }
        }

        // Follow nearest neighbors until two clusters point at each other.
        let (x, y, current_min) = loop {
            let x = chain[chain.len() - 1];
            let (mut y, mut current_min) = if chain.len() > 1 {
                let prev = chain[chain.len() - 2];
                (prev, dist[condensed_index(n, x, prev)])
            } else {
                (x, f64::INFINITY)
            };
            for i in 0..n {
                if size[i] == 0 || i == x {
                    continue;
                }
                let d = dist[condensed_index(n, x, i)];
                if d < current_min {
                    current_min = d;
                    y = i;
                }
            }
            if chain.len() > 1 && y == chain[chain.len() - 2] {
                break (x, y, current_min);
            }
            chain.push(y);
        };
        chain.truncate(chain.len() - 2);

        let (x, y) = if x > y { (y, x) } else { (x, y) };
        let (nx, ny) = (size[x], size[y]);
        merges.push(Merge {
            left: x,
            right: y,
            distance: current_min,
            size: nx + ny,
        });
        size[x] = 0;
        size[y] = nx + ny;

        for i in 0..n {
            if size[i] == 0 || i == y {
                continue;
            }
            let d = dist[condensed_index(n, i, x)].max(dist[condensed_index(n, i, y)]);
            dist[condensed_index(n, i, y)] = d;
        }
    }

    // stable, so equal distances keep discovery order
    merges.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    relabel(&mut merges, n);

    Ok(Linkage {
        n_leaves: n,
        merges,
    })
}

/// Rewrite slot indices as cluster ids (`n + merge index`) via union-find.
fn relabel(merges: &mut [Merge], n: usize) {
    let mut parent: Vec<usize> = (0..2 * n - 1).collect();
    let mut sizes = vec![1usize; 2 * n - 1];
    let mut next_label = n;

    fn find(parent: &mut [usize], mut x: usize) -> usize {
        let mut root = x;
        while parent[root] != root {
            root = parent[root];
        }
        while parent[x] != root {
            let next = parent[x];
            parent[x] = root;
            x = next;
        }
        root
    }

    for merge in merges.iter_mut() {
        let x_root = find(&mut parent, merge.left);
        let y_root = find(&mut parent, merge.right);
        let (left, right) = if x_root < y_root {
            (x_root, y_root)
        } else {
            (y_root, x_root)
        };
        merge.left = left;
        merge.right = right;

        parent[x_root] = next_label;
        parent[y_root] = next_label;
        sizes[next_label] = sizes[x_root] + sizes[y_root];
        merge.size = sizes[next_label];
        next_label += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(values: &[&[f64]]) -> DMatrix<f64> {
        let ncols = values[0].len();
        DMatrix::from_fn(values.len(), ncols, |r, c| values[r][c])
    }

    #[test]
    fn test_condensed_index() {
        // n = 4: (0,1) (0,2) (0,3) (1,2) (1,3) (2,3)
        assert_eq!(condensed_index(4, 0, 1), 0);
        assert_eq!(condensed_index(4, 3, 0), 2);
        assert_eq!(condensed_index(4, 1, 2), 3);
        assert_eq!(condensed_index(4, 2, 3), 5);
    }

    #[test]
    fn test_pairwise_euclidean() {
        let obs = points(&[&[0.0, 0.0], &[3.0, 4.0], &[6.0, 8.0]]);
        let d = pairwise_euclidean(&obs);
        assert_eq!(d.len(), 3);
        assert!((d[0] - 5.0).abs() < 1e-10);
        assert!((d[1] - 10.0).abs() < 1e-10);
        assert!((d[2] - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_two_pairs() {
        let obs = points(&[&[0.0], &[10.0], &[1.0], &[11.0]]);
        let linkage = linkage_complete(&obs).unwrap();

        let merges = linkage.merges();
        assert_eq!((merges[0].left, merges[0].right), (0, 2));
        assert_eq!((merges[1].left, merges[1].right), (1, 3));
        assert_eq!((merges[2].left, merges[2].right), (4, 5));
        // complete linkage: farthest pair across {0,1} and {10,11}
        assert!((merges[2].distance - 11.0).abs() < 1e-10);
        assert_eq!(merges[2].size, 4);

        assert_eq!(linkage.leaf_order(), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_merge_distance_uses_farthest_pair() {
        let obs = points(&[&[0.0], &[2.0], &[4.0], &[5.5]]);
        let linkage = linkage_complete(&obs).unwrap();
        let merges = linkage.merges();
        assert_eq!((merges[0].left, merges[0].right), (2, 3));
        assert_eq!((merges[1].left, merges[1].right), (0, 1));
        // single linkage would give 2.0 here
        assert!((merges[2].distance - 5.5).abs() < 1e-10);
        assert_eq!((merges[2].left, merges[2].right), (4, 5));
        assert_eq!(linkage.leaf_order(), vec![2, 3, 0, 1]);
    }

    #[test]
    fn test_singleton_joins_cluster() {
        let obs = points(&[&[0.0, 10.0, 1.0, 11.0], &[0.0, 10.0, 1.0, 11.0], &[5.0, 5.0, 5.0, 5.0]]);
        let linkage = linkage_complete(&obs).unwrap();
        assert_eq!(linkage.merges()[0].distance, 0.0);
        assert_eq!(
            (linkage.merges()[1].left, linkage.merges()[1].right),
            (2, 3)
        );
        assert_eq!(linkage.leaf_order(), vec![2, 0, 1]);
        assert_eq!(linkage.to_rows()[1], [2.0, 3.0, 102f64.sqrt(), 3.0]);
    }

    #[test]
    fn test_leaf_order_is_permutation() {
        let obs = DMatrix::from_fn(9, 3, |r, c| ((r * 7 + c * 3) % 5) as f64 + r as f64 * 0.1);
        let linkage = linkage_complete(&obs).unwrap();
        let mut order = linkage.leaf_order();
        assert_eq!(linkage.merges().len(), 8);
        assert!(linkage
            .merges()
            .windows(2)
            .all(|w| w[0].distance <= w[1].distance));
        order.sort();
        assert_eq!(order, (0..9).collect::<Vec<_>>());
    }

    #[test]
    fn test_degenerate_input() {
        assert!(linkage_complete(&points(&[&[1.0, 2.0]])).is_err());
        assert!(linkage_complete(&points(&[&[1.0], &[f64::NAN]])).is_err());
    }
}
