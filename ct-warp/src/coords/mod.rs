//! 坐标场: 采样坐标的构建与几何复合.
//!
//! 坐标场是形状为 `[n_dim, *spatial_shape]` 的 `f64` 数组, 元素
//! `[d, i0, i1, ..]` 表示输出位置 `(i0, i1, ..)` 沿轴 `d` 应当采样的
//! (可能是小数的) 坐标值.
//!
//! 存在两种互不混用的坐标约定, 由两个独立类型表示:
//!
//! 1. [`CenteredCoords`] — 零中心空间, 原点在形状的几何中心.
//!    旋转, 缩放与弹性形变只在该空间内复合.
//! 2. [`AbsoluteCoords`] — 绝对索引空间, 原点在索引 0.
//!    插值重采样只消费该空间.
//!
//! [`CenteredCoords::recenter`] 是二者之间唯一的桥梁.

use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn};

pub mod elastic;

pub mod rotation;

pub use rotation::{
    random_rotation_matrix, rotation_matrix_2d, rotation_matrix_3d, rotation_matrix_x_3d,
    rotation_matrix_y_3d, rotation_matrix_z_3d,
};

/// 断言坐标场数组的形状合法: 第一维长度等于剩余维数.
#[inline]
fn assert_field_shape(data: &ArrayD<f64>) {
    assert!(data.ndim() >= 2, "坐标场至少需要 1 个空间维度");
    assert_eq!(
        data.len_of(Axis(0)),
        data.ndim() - 1,
        "坐标场第一维长度 {} 与空间维数 {} 不一致",
        data.len_of(Axis(0)),
        data.ndim() - 1
    );
}

/// 零中心坐标场. 每个轴的坐标以 1 为步长递增,
/// 且整个场的质心位于每个轴的 0 处.
#[derive(Clone, Debug, PartialEq)]
pub struct CenteredCoords {
    data: ArrayD<f64>,
}

/// 绝对索引坐标场. 索引 `(0, 0, ..)` 对应数组索引 0.
#[derive(Clone, Debug, PartialEq)]
pub struct AbsoluteCoords {
    data: ArrayD<f64>,
}

impl CenteredCoords {
    /// 为长度为 N 的空间形状构建零中心网格, 输出形状恰为 `[N, *shape]`.
    ///
    /// 每个轴的偏移量为 `(extent - 1) / 2`, 奇偶长度以同一浮点方式居中.
    /// 无随机性.
    pub fn mesh(shape: &[usize]) -> Self {
        assert!(!shape.is_empty(), "空间形状不能为空");
        assert!(shape.iter().all(|&e| e > 0), "空间各轴长度必须为正");

        let n = shape.len();
        let mut full = Vec::with_capacity(n + 1);
        full.push(n);
        full.extend_from_slice(shape);

        let data = ArrayD::from_shape_fn(IxDyn(&full), |idx| {
            let d = idx[0];
            idx[d + 1] as f64 - (shape[d] as f64 - 1.0) / 2.0
        });
        Self { data }
    }

    /// 从裸数组构建. 形状必须满足 `[N, *spatial]` 且第一维长度为 N.
    pub fn from_raw(data: ArrayD<f64>) -> Self {
        assert_field_shape(&data);
        Self { data }
    }

    /// 空间维数 N.
    #[inline]
    pub fn ndim_spatial(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 空间形状.
    #[inline]
    pub fn spatial_shape(&self) -> &[usize] {
        &self.data.shape()[1..]
    }

    /// 只读视图.
    #[inline]
    pub fn view(&self) -> ArrayViewD<'_, f64> {
        self.data.view()
    }

    /// 取出内部数组.
    #[inline]
    pub fn into_inner(self) -> ArrayD<f64> {
        self.data
    }

    /// 逐元素乘以单个缩放因子.
    #[must_use]
    pub fn scaled(mut self, factor: f64) -> Self {
        self.data.mapv_inplace(|v| v * factor);
        self
    }

    /// 逐轴缩放. `factors` 长度必须等于空间维数.
    #[must_use]
    pub fn scaled_per_axis(mut self, factors: &[f64]) -> Self {
        assert_eq!(
            factors.len(),
            self.ndim_spatial(),
            "缩放因子个数 {} 与空间维数 {} 不一致",
            factors.len(),
            self.ndim_spatial()
        );
        for (mut plane, &f) in self.data.outer_iter_mut().zip(factors) {
            plane.mapv_inplace(|v| v * f);
        }
        self
    }

    /// 转换到绝对索引空间: 每个轴加回 `(extent - 1) / 2` 偏移.
    ///
    /// 输入不会被修改. 对未经变换的网格, 该操作是 [`Self::mesh`]
    /// 居中步骤的精确逆.
    pub fn recenter(&self) -> AbsoluteCoords {
        let shape = self.spatial_shape().to_vec();
        let mut data = self.data.clone();
        for (d, mut plane) in data.outer_iter_mut().enumerate() {
            let offset = (shape[d] as f64 - 1.0) / 2.0;
            plane.mapv_inplace(|v| v + offset);
        }
        AbsoluteCoords { data }
    }
}

impl AbsoluteCoords {
    /// 从裸数组构建. 形状必须满足 `[N, *spatial]` 且第一维长度为 N.
    pub fn from_raw(data: ArrayD<f64>) -> Self {
        assert_field_shape(&data);
        Self { data }
    }

    /// 为空间形状构建绝对索引网格: `[d, i0, i1, ..] == i_d`.
    pub fn index_mesh(shape: &[usize]) -> Self {
        assert!(!shape.is_empty(), "空间形状不能为空");

        let n = shape.len();
        let mut full = Vec::with_capacity(n + 1);
        full.push(n);
        full.extend_from_slice(shape);

        let data = ArrayD::from_shape_fn(IxDyn(&full), |idx| idx[idx[0] + 1] as f64);
        Self { data }
    }

    /// 空间维数 N.
    #[inline]
    pub fn ndim_spatial(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// 空间形状.
    #[inline]
    pub fn spatial_shape(&self) -> &[usize] {
        &self.data.shape()[1..]
    }

    /// 只读视图.
    #[inline]
    pub fn view(&self) -> ArrayViewD<'_, f64> {
        self.data.view()
    }

    /// 取出内部数组.
    #[inline]
    pub fn into_inner(self) -> ArrayD<f64> {
        self.data
    }
}
