//! 通用常量.

use std::f64::consts::PI;

/// 归一化除法的最小幅值下限. 任何作为除数的能量值都不会低于它,
/// 以避免产生无效/溢出输出.
pub const NORM_EPS: f64 = 1e-8;

/// 高斯核截断半径系数 (核半径 = `GAUSS_TRUNCATE * sigma + 0.5` 取整).
pub const GAUSS_TRUNCATE: f64 = 4.0;

/// 包围盒提取时, 每个样本默认保留的最大实例个数.
pub const DEFAULT_N_MAX_GT: usize = 3;

/// 支持的最高插值阶数.
pub const MAX_INTERP_ORDER: u8 = 5;

/// 随机旋转的默认角度抽取区间: 整圆.
pub const FULL_CIRCLE: (f64, f64) = (0.0, 2.0 * PI);
