//! 强度操作: 光照抖动与灰度世界 (Mink 范数) 颜色恒常性归一化.
//!
//! 这些操作都把第 0 维当作颜色/模态通道, 其余维为空间维.

use crate::consts::NORM_EPS;
use crate::error::AugError;
use crate::filter::{gaussian_filter, gaussian_gradient_magnitude, BoundaryMode};
use crate::RandomSource;
use itertools::izip;
use ndarray::{ArrayD, ArrayView1, ArrayView2, ArrayViewD, Axis, IxDyn, Slice};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 逐通道白色估计所用的范数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MinkNorm {
    /// Mink p 范数: `(sum v^p)^(1/p)`. `Power(1.0)` 即灰度世界假设.
    Power(f64),

    /// 取未掩膜区域的最大值 (white-patch 假设).
    Max,
}

/// 光照抖动: 以主成分基 `u` 和强度尺度 `s` 生成逐通道加性扰动.
///
/// `img` 形状 `[C, *spatial]`, `u` 形状 `[C, K]`, `s` 长度 `K`.
/// 每个分量抽取 `alpha_k ~ N(0, sigma)`, 通道 `c` 整体加上
/// `sum_k u[c, k] * alpha_k * s[k]`. `sigma == 0` 时为恒等操作.
pub fn illumination_jitter(
    img: ArrayViewD<'_, f64>,
    u: ArrayView2<'_, f64>,
    s: ArrayView1<'_, f64>,
    sigma: f64,
    rng: &mut RandomSource,
) -> ArrayD<f64> {
    assert_eq!(
        img.len_of(Axis(0)),
        u.nrows(),
        "通道数 {} 与基矩阵行数 {} 不一致",
        img.len_of(Axis(0)),
        u.nrows()
    );
    assert_eq!(
        u.ncols(),
        s.len(),
        "基矩阵列数 {} 与尺度向量长度 {} 不一致",
        u.ncols(),
        s.len()
    );

    let alpha: Vec<f64> = (0..s.len()).map(|_| rng.normal(0.0, sigma)).collect();

    let mut out = img.to_owned();
    for (c, mut channel) in out.axis_iter_mut(Axis(0)).enumerate() {
        let jitter: f64 = izip!(u.row(c), &alpha, s)
            .map(|(basis, a, scale)| basis * a * scale)
            .sum();
        channel.mapv_inplace(|v| v + jitter);
    }
    out
}

/// 立方体结构元的灰度膨胀 (逐位置取窗口最大值). 边缘钳制.
fn grey_dilation(img: ArrayViewD<'_, f64>, size: usize) -> ArrayD<f64> {
    assert!(size % 2 == 1, "膨胀窗口必须为奇数, 实际为 {size}");
    let radius = (size / 2) as i64;
    let shape = img.shape().to_vec();
    let nd = shape.len();

    ArrayD::from_shape_fn(IxDyn(&shape), |idx| {
        let mut offsets = vec![-radius; nd];
        let mut probe = vec![0usize; nd];
        let mut best = f64::NEG_INFINITY;
        loop {
            for d in 0..nd {
                probe[d] =
                    (idx[d] as i64 + offsets[d]).clamp(0, shape[d] as i64 - 1) as usize;
            }
            let v = img[probe.as_slice()];
            if v > best {
                best = v;
            }

            // 里程计推进窗口偏移.
            let mut d = nd;
            loop {
                if d == 0 {
                    return best;
                }
                d -= 1;
                if offsets[d] < radius {
                    offsets[d] += 1;
                    offsets[d + 1..].fill(-radius);
                    break;
                }
            }
        }
    })
}

/// 颜色恒常性归一化 (可变通道数的灰度世界族算法).
///
/// `img` 形状 `[C, *spatial]`. 流程:
///
/// 1. 过饱和掩膜: 逐通道灰度膨胀后, 任一通道达到
///    `saturation_threshold` 的位置被掩去; 与调用方给定的 `mask` 取并.
/// 2. `sigma != 0` 时把每个空间轴两端宽度为 `sigma` 的边带也掩去.
/// 3. `diff_order == 0` 时对各通道做高斯平滑 (`sigma != 0` 时),
///    `diff_order == 1` 时取高斯梯度幅值; 更高阶导数不支持, 返回错误.
/// 4. 逐通道在未掩膜区域上按 `mink_norm` 估计白色, 跨通道 L2 归一化.
/// 5. 原图各通道除以 `white[c] * sqrt(3)` (除数下限
///    [`crate::consts::NORM_EPS`]); `clip_range` 为真时钳回原值域.
///
/// 返回归一化后的白色估计与输出图像.
#[allow(clippy::too_many_arguments)]
pub fn color_constancy_normalize(
    img: ArrayViewD<'_, f64>,
    diff_order: u8,
    mink_norm: MinkNorm,
    sigma: f64,
    mask: Option<ArrayViewD<'_, u8>>,
    saturation_threshold: f64,
    dilation_size: usize,
    clip_range: bool,
) -> Result<(Vec<f64>, ArrayD<f64>), AugError> {
    if diff_order > 1 {
        return Err(AugError::UnsupportedDiffOrder(diff_order));
    }
    assert!(img.ndim() >= 2, "图像至少要有一个通道维和一个空间维");

    let spatial = img.shape()[1..].to_vec();
    let (minm, maxm) = if clip_range {
        let minm = img.iter().copied().fold(f64::INFINITY, f64::min);
        let maxm = img.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        (minm, maxm)
    } else {
        (0.0, 0.0)
    };

    let mut mask_im = match mask {
        Some(m) => {
            assert_eq!(
                m.shape(),
                spatial.as_slice(),
                "掩膜形状 {:?} 与空间形状 {:?} 不一致",
                m.shape(),
                spatial
            );
            m.mapv(|v| u8::from(v != 0))
        }
        None => ArrayD::zeros(IxDyn(&spatial)),
    };

    // 过饱和位置 (膨胀后任一通道超阈值) 不参与白色估计.
    for channel in img.axis_iter(Axis(0)) {
        let dilated = grey_dilation(channel, dilation_size);
        mask_im.zip_mut_with(&dilated, |m, &d| {
            if d >= saturation_threshold {
                *m = 1;
            }
        });
    }

    let strip = sigma as usize;
    if strip > 0 {
        for ax in 0..mask_im.ndim() {
            let len = mask_im.len_of(Axis(ax));
            let w = strip.min(len);
            mask_im
                .slice_axis_mut(Axis(ax), Slice::from(0..w))
                .fill(1);
            mask_im
                .slice_axis_mut(Axis(ax), Slice::from(len - w..len))
                .fill(1);
        }
    }

    // 白色估计在平滑/求导后的绝对值图上进行, 输出用的是原图.
    let estimation: Vec<ArrayD<f64>> = img
        .axis_iter(Axis(0))
        .map(|channel| {
            let mut processed = match diff_order {
                0 if sigma != 0.0 => {
                    gaussian_filter(channel, sigma, BoundaryMode::Nearest, 0.0)
                }
                0 => channel.to_owned(),
                _ => gaussian_gradient_magnitude(channel, sigma, BoundaryMode::Nearest, 0.0),
            };
            processed.mapv_inplace(f64::abs);
            processed
        })
        .collect();

    let mut white_colors: Vec<f64> = estimation
        .iter()
        .map(|channel| {
            let unmasked = channel
                .iter()
                .zip(mask_im.iter())
                .filter(|(_, &m)| m == 0)
                .map(|(&v, _)| v);
            match mink_norm {
                MinkNorm::Power(p) => unmasked.map(|v| v.powf(p)).sum::<f64>().powf(1.0 / p),
                MinkNorm::Max => unmasked.fold(0.0, f64::max),
            }
        })
        .collect();

    let som = white_colors
        .iter()
        .map(|w| w * w)
        .sum::<f64>()
        .sqrt()
        .max(NORM_EPS);
    white_colors.iter_mut().for_each(|w| *w /= som);

    let mut out = img.to_owned();
    for (mut channel, &white) in out.axis_iter_mut(Axis(0)).zip(&white_colors) {
        let divisor = (white * 3.0_f64.sqrt()).max(NORM_EPS);
        channel.mapv_inplace(|v| v / divisor);
    }
    if clip_range {
        out.mapv_inplace(|v| v.clamp(minm, maxm));
    }
    Ok((white_colors, out))
}
