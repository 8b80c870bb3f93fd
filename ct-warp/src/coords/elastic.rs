//! 弹性形变场.
//!
//! 每个轴独立地: 在空间形状上采样 `[-1, 1]` 均匀噪声, 以 `sigma`
//! 做高斯平滑 (常数边界, 填充 0), 再乘以幅度 `alpha`.
//! `sigma` 越大位移越平滑, 空间相关性越强; `alpha` 控制位移幅度.

use super::{AbsoluteCoords, CenteredCoords};
use crate::filter::{gaussian_filter, BoundaryMode};
use crate::RandomSource;
use ndarray::{ArrayD, Axis, IxDyn};

/// 生成单个平滑噪声场: 均匀噪声 -> 高斯平滑 -> 幅度缩放.
pub fn noise_field(
    shape: &[usize],
    alpha: f64,
    sigma: f64,
    rng: &mut RandomSource,
) -> ArrayD<f64> {
    let noise = rng.unit_noise(shape);
    let mut smoothed = gaussian_filter(noise.view(), sigma, BoundaryMode::Constant, 0.0);
    smoothed.mapv_inplace(|v| v * alpha);
    smoothed
}

/// 生成逐轴位移场, 形状 `[N, *shape]`. 每个轴使用独立的随机抽取.
fn per_axis_offsets(
    shape: &[usize],
    alpha: f64,
    sigma: f64,
    rng: &mut RandomSource,
) -> ArrayD<f64> {
    let n = shape.len();
    let mut full = Vec::with_capacity(n + 1);
    full.push(n);
    full.extend_from_slice(shape);

    let mut offsets = ArrayD::<f64>::zeros(IxDyn(&full));
    for mut plane in offsets.axis_iter_mut(Axis(0)) {
        plane.assign(&noise_field(shape, alpha, sigma, rng));
    }
    offsets
}

impl CenteredCoords {
    /// 在既有坐标场上叠加新鲜生成的逐轴弹性位移.
    #[must_use]
    pub fn elastic_deformed(mut self, alpha: f64, sigma: f64, rng: &mut RandomSource) -> Self {
        let offsets = per_axis_offsets(&self.spatial_shape().to_vec(), alpha, sigma, rng);
        self.data += &offsets;
        self
    }
}

impl AbsoluteCoords {
    /// 构建纯形变坐标系: 绝对索引网格加上逐轴弹性位移.
    pub fn elastic_transform(
        shape: &[usize],
        alpha: f64,
        sigma: f64,
        rng: &mut RandomSource,
    ) -> Self {
        let mut mesh = Self::index_mesh(shape);
        mesh.data += &per_axis_offsets(shape, alpha, sigma, rng);
        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::noise_field;
    use crate::{AbsoluteCoords, CenteredCoords, RandomSource};
    use ndarray::Axis;

    /// `alpha = 0` 时形变退化为恒等.
    #[test]
    fn test_zero_alpha_identity() {
        let mut rng = RandomSource::from_seed(5);
        let mesh = CenteredCoords::mesh(&[6, 6]);
        let deformed = mesh.clone().elastic_deformed(0.0, 2.0, &mut rng);
        assert_eq!(mesh, deformed);
    }

    /// `sigma = 0` 时平滑是恒等操作, 位移就是缩放后的原始噪声,
    /// 因而绝对值不超过 `alpha`.
    #[test]
    fn test_sigma_zero_bounds() {
        let mut rng = RandomSource::from_seed(6);
        let field = noise_field(&[8, 8], 3.0, 0.0, &mut rng);
        assert!(field.iter().all(|v| v.abs() <= 3.0));
        assert!(field.iter().any(|v| v.abs() > 0.0));
    }

    /// 各轴必须使用独立的随机抽取, 不得复用同一份噪声.
    #[test]
    fn test_axis_independence() {
        let mut rng = RandomSource::from_seed(7);
        let coords = AbsoluteCoords::elastic_transform(&[10, 10], 5.0, 1.0, &mut rng);
        let mesh = AbsoluteCoords::index_mesh(&[10, 10]);

        let off = coords.view().to_owned() - mesh.view();
        let a0 = off.index_axis(Axis(0), 0).to_owned();
        let a1 = off.index_axis(Axis(0), 1).to_owned();
        assert_ne!(a0, a1);
    }

    /// 位移场形状与网格一致, 且非退化参数下确实扰动了坐标.
    #[test]
    fn test_deformation_present() {
        let mut rng = RandomSource::from_seed(8);
        let mesh = CenteredCoords::mesh(&[7, 9]);
        let deformed = mesh.clone().elastic_deformed(4.0, 1.5, &mut rng);
        assert_eq!(deformed.spatial_shape(), &[7, 9]);
        assert_ne!(mesh, deformed);
    }
}
