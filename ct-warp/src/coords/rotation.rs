//! 旋转矩阵的构建与坐标场的旋转.
//!
//! 3D 组合旋转的复合顺序固定为 x -> y -> z (即 `Rx · Ry · Rz`),
//! 该顺序不可交换, 必须精确保持.

use super::CenteredCoords;
use crate::consts::FULL_CIRCLE;
use crate::RandomSource;
use ndarray::{Array2, IxDyn};

/// 标准 2x2 旋转矩阵, `angle` 以弧度计.
pub fn rotation_matrix_2d(angle: f64) -> Array2<f64> {
    let (sin, cos) = angle.sin_cos();
    ndarray::array![[cos, -sin], [sin, cos]]
}

/// 绕 x 轴的 3x3 旋转矩阵.
pub fn rotation_matrix_x_3d(angle: f64) -> Array2<f64> {
    let (sin, cos) = angle.sin_cos();
    ndarray::array![[1.0, 0.0, 0.0], [0.0, cos, -sin], [0.0, sin, cos]]
}

/// 绕 y 轴的 3x3 旋转矩阵.
pub fn rotation_matrix_y_3d(angle: f64) -> Array2<f64> {
    let (sin, cos) = angle.sin_cos();
    ndarray::array![[cos, 0.0, sin], [0.0, 1.0, 0.0], [-sin, 0.0, cos]]
}

/// 绕 z 轴的 3x3 旋转矩阵.
pub fn rotation_matrix_z_3d(angle: f64) -> Array2<f64> {
    let (sin, cos) = angle.sin_cos();
    ndarray::array![[cos, -sin, 0.0], [sin, cos, 0.0], [0.0, 0.0, 1.0]]
}

/// 组合 3D 旋转矩阵 `Rx(angle_x) · Ry(angle_y) · Rz(angle_z)`.
pub fn rotation_matrix_3d(angle_x: f64, angle_y: f64, angle_z: f64) -> Array2<f64> {
    rotation_matrix_x_3d(angle_x)
        .dot(&rotation_matrix_y_3d(angle_y))
        .dot(&rotation_matrix_z_3d(angle_z))
}

/// 随机 3D 旋转: 三个角各自独立地从对应 `[low, high)` 区间均匀抽取,
/// `None` 表示整圆. 返回按固定顺序复合后的矩阵.
pub fn random_rotation_matrix(
    rng: &mut RandomSource,
    angle_x: Option<(f64, f64)>,
    angle_y: Option<(f64, f64)>,
    angle_z: Option<(f64, f64)>,
) -> Array2<f64> {
    let draw = |rng: &mut RandomSource, range: Option<(f64, f64)>| {
        let (lo, hi) = range.unwrap_or(FULL_CIRCLE);
        rng.uniform(lo, hi)
    };
    let ax = draw(rng, angle_x);
    let ay = draw(rng, angle_y);
    let az = draw(rng, angle_z);
    rotation_matrix_3d(ax, ay, az)
}

impl CenteredCoords {
    /// 以任意 NxN 矩阵旋转坐标场.
    ///
    /// 场被展平成 `[N, P]`, 每个坐标列向量经矩阵变换后写回原形状.
    /// 数学上等价于将每个点的坐标向量乘以该矩阵.
    #[must_use]
    pub fn rotated_by(self, matrix: &Array2<f64>) -> Self {
        let n = self.ndim_spatial();
        assert_eq!(
            matrix.dim(),
            (n, n),
            "旋转矩阵形状 {:?} 与空间维数 {} 不一致",
            matrix.dim(),
            n
        );

        let full_shape = self.data.shape().to_vec();
        let points: usize = full_shape[1..].iter().product();

        // 展平要求标准布局; from_raw 允许传入任意布局, 先归一化.
        let mut data = self.data;
        if !data.is_standard_layout() {
            data = data.as_standard_layout().into_owned();
        }
        let flat = data.into_shape((n, points)).unwrap();
        let rotated = matrix.t().dot(&flat);

        Self {
            data: rotated.into_shape(IxDyn(&full_shape)).unwrap(),
        }
    }

    /// 2D 旋转.
    #[must_use]
    pub fn rotated_2d(self, angle: f64) -> Self {
        assert_eq!(self.ndim_spatial(), 2, "rotated_2d 要求二维坐标场");
        self.rotated_by(&rotation_matrix_2d(angle))
    }

    /// 3D 旋转, 复合顺序 x -> y -> z.
    #[must_use]
    pub fn rotated_3d(self, angle_x: f64, angle_y: f64, angle_z: f64) -> Self {
        assert_eq!(self.ndim_spatial(), 3, "rotated_3d 要求三维坐标场");
        self.rotated_by(&rotation_matrix_3d(angle_x, angle_y, angle_z))
    }
}
