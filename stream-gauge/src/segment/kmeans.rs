//! 两类 k-means.
//!
//! 以每个像素的通道向量为样本点. 初始化采用 k-means++ 规则, 随机数全部来自
//! 由种子确定的 `StdRng`, 因此同样的输入与种子总是得到同样的划分.

use crate::consts::CLUSTERS;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 一次聚类的结果.
#[derive(Clone, Debug)]
pub(crate) struct Partition {
    /// 每个样本所属的类别 (0 或 1).
    pub labels: Vec<u8>,

    /// 两个质心. 形状 `(2, 通道数)`.
    pub centroids: Array2<f64>,

    /// 样本到所属质心的距离平方和.
    pub inertia: f64,

    /// 实际迭代次数.
    pub iterations: u32,
}

/// 两类 k-means 求解器.
pub(crate) struct KMeans2<'a> {
    /// 样本矩阵, 形状 `(样本数, 通道数)`.
    points: ArrayView2<'a, f64>,
    max_iter: u32,
    tolerance: f64,
}

impl<'a> KMeans2<'a> {
    /// `points` 不能为空, 否则 panic.
    pub fn new(points: ArrayView2<'a, f64>, max_iter: u32, tolerance: f64) -> Self {
        assert!(points.nrows() > 0, "至少需要一个样本");
        Self {
            points,
            max_iter: max_iter.max(1),
            tolerance,
        }
    }

    /// 以 `seed, seed + 1, ...` 依次运行 `restarts` 次, 返回惯性最小的一次.
    /// 惯性相同时取较早的一次.
    pub fn best_of(&self, seed: u64, restarts: u32) -> Partition {
        (0..restarts.max(1) as u64)
            .map(|r| self.run(&mut StdRng::seed_from_u64(seed.wrapping_add(r))))
            .min_by_key(|p| OrderedFloat(p.inertia))
            .unwrap_or_else(|| unreachable!())
    }

    /// 单次运行.
    pub fn run(&self, rng: &mut StdRng) -> Partition {
        let mut centroids = self.init_plus_plus(rng);
        let mut labels = vec![0u8; self.points.nrows()];
        let mut iterations = 0;

        while iterations < self.max_iter {
            iterations += 1;
            self.assign(centroids.view(), &mut labels);
            let next = self.update(&labels, centroids.view());
            let shift: f64 = (&next - &centroids).mapv(|d| d * d).sum();
            centroids = next;
            if shift <= self.tolerance {
                break;
            }
        }
        let inertia = self.assign(centroids.view(), &mut labels);
        log::trace!("kmeans.run | iterations: {iterations}, inertia: {inertia:.3}");

        Partition {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }

    /// k-means++ 初始化: 第一个质心均匀抽取, 第二个按到第一个质心的距离平方加权抽取.
    /// 所有样本重合时两个质心相同.
    fn init_plus_plus(&self, rng: &mut StdRng) -> Array2<f64> {
        let n = self.points.nrows();
        let first = rng.random_range(0..n);
        let c0 = self.points.row(first);

        let d2: Vec<f64> = self
            .points
            .axis_iter(Axis(0))
            .map(|p| sq_dist(p, c0))
            .collect();
        let total: f64 = d2.iter().sum();

        let second = if total > 0.0 {
            let target = rng.random::<f64>() * total;
            let mut acc = 0.0;
            d2.iter()
                .position(|d| {
                    acc += d;
                    acc > target
                })
                .unwrap_or_else(|| d2.iter().rposition(|d| *d > 0.0).unwrap_or(first))
        } else {
            first
        };

        let mut centroids = Array2::zeros((CLUSTERS, self.points.ncols()));
        centroids.row_mut(0).assign(&c0);
        centroids.row_mut(1).assign(&self.points.row(second));
        centroids
    }

    /// 将每个样本分到最近的质心 (距离相同时归入类别 0). 返回惯性.
    fn assign(&self, centroids: ArrayView2<f64>, labels: &mut [u8]) -> f64 {
        let (c0, c1) = (centroids.row(0), centroids.row(1));
        let mut inertia = 0.0;
        for (p, label) in self.points.axis_iter(Axis(0)).zip(labels.iter_mut()) {
            let (d0, d1) = (sq_dist(p, c0), sq_dist(p, c1));
            if d1 < d0 {
                *label = 1;
                inertia += d1;
            } else {
                *label = 0;
                inertia += d0;
            }
        }
        inertia
    }

    /// 重新计算质心. 空类别保留旧质心.
    fn update(&self, labels: &[u8], old: ArrayView2<f64>) -> Array2<f64> {
        let dim = self.points.ncols();
        let mut sums = [Array1::<f64>::zeros(dim), Array1::<f64>::zeros(dim)];
        let mut counts = [0usize; CLUSTERS];
        for (p, &label) in self.points.axis_iter(Axis(0)).zip(labels) {
            sums[label as usize] += &p;
            counts[label as usize] += 1;
        }

        let mut next = old.to_owned();
        for (k, (sum, count)) in sums.iter().zip(counts).enumerate() {
            if count > 0 {
                next.row_mut(k).assign(&(sum / count as f64));
            }
        }
        next
    }
}

#[inline]
fn sq_dist(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_two_obvious_groups() {
        let pts = array![[0.0], [1.0], [2.0], [100.0], [101.0], [99.0]];
        let part = KMeans2::new(pts.view(), 50, 1e-6).best_of(7, 3);
        assert_eq!(part.labels[0], part.labels[1]);
        assert_eq!(part.labels[1], part.labels[2]);
        assert_eq!(part.labels[3], part.labels[4]);
        assert_ne!(part.labels[0], part.labels[3]);
        assert!((part.inertia - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_identical_points() {
        let pts = Array2::from_elem((5, 3), 42.0);
        let part = KMeans2::new(pts.view(), 10, 1e-6).best_of(0, 2);
        assert!(part.labels.iter().all(|l| *l == 0));
        assert_eq!(part.inertia, 0.0);
    }

    #[test]
    fn test_same_seed_same_partition() {
        let pts = Array2::from_shape_fn((40, 2), |(i, k)| ((i * 7 + k * 3) % 11) as f64);
        let km = KMeans2::new(pts.view(), 100, 1e-9);
        let a = km.best_of(1234, 3);
        let b = km.best_of(1234, 3);
        assert_eq!(a.labels, b.labels);
        assert_eq!(a.centroids, b.centroids);
    }
}
