//! 插值重采样.
//!
//! [`map_coordinates`] 在绝对索引坐标场指定的 (可能是小数的) 位置上
//! 采样源数组, 是所有几何变换的最终执行者. [`resize`] 在其上构建
//! 中心对齐的坐标映射实现任意形状缩放.
//!
//! 插值阶数约定: 0 = 最近邻, 1 = 多重线性, 2..=5 = 三次样条型
//! (Catmull-Rom 插值核, 在整数坐标处精确还原源值). 阶数超过 5 视为
//! 合同违例, 直接 panic.

use crate::consts::MAX_INTERP_ORDER;
use crate::coords::AbsoluteCoords;
use crate::filter::BoundaryMode;
use ndarray::{ArrayD, ArrayViewD, Dimension, IxDyn};

/// 每个轴最多的插值采样点数 (三次核为 4).
const MAX_TAPS: usize = 4;

/// 单轴采样点: (整数坐标, 权重) 对.
type AxisTaps = [(i64, f64); MAX_TAPS];

/// Catmull-Rom 三次插值核在分数位置 `t` 处的 4 个权重,
/// 对应偏移 -1, 0, 1, 2. 权重和恒为 1.
#[inline]
fn catmull_rom_weights(t: f64) -> [f64; 4] {
    [
        ((-0.5 * t + 1.0) * t - 0.5) * t,
        (1.5 * t - 2.5) * t * t + 1.0,
        ((-1.5 * t + 2.0) * t + 0.5) * t,
        (0.5 * t - 0.5) * t * t,
    ]
}

/// 计算坐标 `c` 在给定阶数下沿单轴的采样点集. 返回 (taps, 个数).
#[inline]
fn axis_taps(c: f64, order: u8) -> (AxisTaps, usize) {
    let mut taps = [(0i64, 0.0f64); MAX_TAPS];
    match order {
        0 => {
            // scipy 约定: floor(x + 0.5).
            taps[0] = ((c + 0.5).floor() as i64, 1.0);
            (taps, 1)
        }
        1 => {
            let base = c.floor();
            let t = c - base;
            let base = base as i64;
            taps[0] = (base, 1.0 - t);
            taps[1] = (base + 1, t);
            (taps, 2)
        }
        _ => {
            let base = c.floor();
            let t = c - base;
            let base = base as i64 - 1;
            let w = catmull_rom_weights(t);
            for (k, (tap, weight)) in taps.iter_mut().enumerate() {
                *tap = base + k as i64;
                *weight = w[k];
            }
            (taps, 4)
        }
    }
}

/// 以给定越界策略取出整数索引处的源值.
fn fetch(img: &ArrayViewD<'_, f64>, idx: &[i64], mode: BoundaryMode, cval: f64, buf: &mut [usize]) -> f64 {
    for (d, &i) in idx.iter().enumerate() {
        let n = img.shape()[d] as i64;
        if (0..n).contains(&i) {
            buf[d] = i as usize;
        } else {
            match mode {
                BoundaryMode::Constant => return cval,
                BoundaryMode::Nearest => buf[d] = i.clamp(0, n - 1) as usize,
            }
        }
    }
    img[IxDyn(buf)]
}

/// 在单个 (可能是小数的) 点处插值采样.
fn sample_point(
    img: &ArrayViewD<'_, f64>,
    point: &[f64],
    order: u8,
    mode: BoundaryMode,
    cval: f64,
    idx_buf: &mut [i64],
    fetch_buf: &mut [usize],
) -> f64 {
    let nd = point.len();

    let mut taps = [([(0i64, 0.0f64); MAX_TAPS], 0usize); 3];
    let taps = &mut taps[..nd];
    for (d, slot) in taps.iter_mut().enumerate() {
        *slot = axis_taps(point[d], order);
    }
    let per_axis = taps[0].1;

    // 张量积累加: 对每个轴的采样点组合求权重乘积.
    let mut acc = 0.0;
    let mut combo = [0usize; 3];
    loop {
        let mut weight = 1.0;
        for d in 0..nd {
            weight *= taps[d].0[combo[d]].1;
        }
        if weight != 0.0 {
            for d in 0..nd {
                idx_buf[d] = taps[d].0[combo[d]].0;
            }
            acc += weight * fetch(img, &idx_buf[..nd], mode, cval, fetch_buf);
        }

        // 步进组合计数器.
        let mut d = 0;
        while d < nd {
            combo[d] += 1;
            if combo[d] < per_axis {
                break;
            }
            combo[d] = 0;
            d += 1;
        }
        if d == nd {
            break acc;
        }
    }
}

/// 在坐标场指定的位置上插值采样源数组.
///
/// 输出形状为坐标场的空间形状. 该函数是单通道/单体数据的;
/// 多通道数据由调用方逐通道调用.
///
/// # 注意
///
/// 1. `img` 的秩必须等于坐标场的空间维数, 否则 panic.
/// 2. `order` 必须在 `0..=5` 内, 否则 panic.
pub fn map_coordinates(
    img: ArrayViewD<'_, f64>,
    coords: &AbsoluteCoords,
    order: u8,
    mode: BoundaryMode,
    cval: f64,
) -> ArrayD<f64> {
    assert_eq!(
        img.ndim(),
        coords.ndim_spatial(),
        "源数组秩 {} 与坐标场空间维数 {} 不一致",
        img.ndim(),
        coords.ndim_spatial()
    );
    assert!(
        order <= MAX_INTERP_ORDER,
        "插值阶数只能在 0..={MAX_INTERP_ORDER} 内, 实际为 {order}"
    );
    assert!(
        (1..=3).contains(&img.ndim()),
        "只支持 1 到 3 维空间数据, 实际秩为 {}",
        img.ndim()
    );

    let nd = img.ndim();
    let spatial = coords.spatial_shape().to_vec();
    let view = coords.view();

    let mut lookup = vec![0usize; nd + 1];
    let mut point = vec![0.0f64; nd];
    let mut idx_buf = vec![0i64; nd];
    let mut fetch_buf = vec![0usize; nd];

    ArrayD::from_shape_fn(IxDyn(&spatial), |idx| {
        lookup[1..].copy_from_slice(idx.slice());
        for d in 0..nd {
            lookup[0] = d;
            point[d] = view[IxDyn(&lookup)];
        }
        sample_point(
            &img,
            &point,
            order,
            mode,
            cval,
            &mut idx_buf,
            &mut fetch_buf,
        )
    })
}

/// 中心对齐缩放: 输出索引 `i` 映射到源坐标 `(i + 0.5) * (旧长/新长) - 0.5`.
///
/// `clip` 为 `true` 时, 把插值结果钳制到源数组的值域内
/// (高阶插值可能过冲). 秩不匹配或新形状含 0 时 panic.
pub fn resize(
    img: ArrayViewD<'_, f64>,
    new_shape: &[usize],
    order: u8,
    mode: BoundaryMode,
    cval: f64,
    clip: bool,
) -> ArrayD<f64> {
    assert_eq!(
        img.ndim(),
        new_shape.len(),
        "新形状秩 {} 与源数组秩 {} 不一致",
        new_shape.len(),
        img.ndim()
    );
    assert!(new_shape.iter().all(|&e| e > 0), "新形状各轴长度必须为正");

    let nd = img.ndim();
    let scales: Vec<f64> = (0..nd)
        .map(|d| img.shape()[d] as f64 / new_shape[d] as f64)
        .collect();

    let mut full = Vec::with_capacity(nd + 1);
    full.push(nd);
    full.extend_from_slice(new_shape);
    let coords = AbsoluteCoords::from_raw(ArrayD::from_shape_fn(IxDyn(&full), |idx| {
        let d = idx[0];
        (idx[d + 1] as f64 + 0.5) * scales[d] - 0.5
    }));

    let mut out = map_coordinates(img.view(), &coords, order, mode, cval);
    if clip && !img.is_empty() {
        let (lo, hi) = img.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
        out.mapv_inplace(|v| v.clamp(lo, hi));
    }
    out
}

/// 最近邻收集式缩放, 元素类型保持不变, 不做任何算术.
///
/// 与 [`resize`] 使用同一套中心对齐坐标映射, 源索引钳制在合法范围内.
pub fn resize_nearest<T: Copy>(img: ArrayViewD<'_, T>, new_shape: &[usize]) -> ArrayD<T> {
    assert_eq!(
        img.ndim(),
        new_shape.len(),
        "新形状秩 {} 与源数组秩 {} 不一致",
        new_shape.len(),
        img.ndim()
    );
    assert!(new_shape.iter().all(|&e| e > 0), "新形状各轴长度必须为正");

    let nd = img.ndim();
    let scales: Vec<f64> = (0..nd)
        .map(|d| img.shape()[d] as f64 / new_shape[d] as f64)
        .collect();

    let mut src = vec![0usize; nd];
    ArrayD::from_shape_fn(IxDyn(new_shape), |idx| {
        for d in 0..nd {
            // floor(x + 0.5), 与 order 0 的 map_coordinates 一致.
            let c = ((idx[d] as f64 + 0.5) * scales[d]).floor() as i64;
            src[d] = c.clamp(0, img.shape()[d] as i64 - 1) as usize;
        }
        img[IxDyn(&src)]
    })
}

#[cfg(test)]
mod tests {
    use super::{map_coordinates, resize, resize_nearest};
    use crate::coords::AbsoluteCoords;
    use crate::filter::BoundaryMode;
    use ndarray::{ArrayD, IxDyn};

    fn float_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn demo_img() -> ArrayD<f64> {
        ArrayD::from_shape_fn(IxDyn(&[4, 5]), |i| (i[0] * 5 + i[1]) as f64)
    }

    /// 整数坐标处, 任何阶数都必须精确还原源值.
    #[test]
    fn test_exact_at_integer_coords() {
        let img = demo_img();
        let coords = AbsoluteCoords::index_mesh(&[4, 5]);
        for order in [0u8, 1, 3, 5] {
            let out = map_coordinates(img.view(), &coords, order, BoundaryMode::Nearest, 0.0);
            assert!(
                img.iter().zip(out.iter()).all(|(a, b)| float_eq(*a, *b)),
                "order {order} 未能还原源值"
            );
        }
    }

    /// 线性插值在半程坐标处取两侧平均.
    #[test]
    fn test_linear_midpoint() {
        let img = demo_img();
        let data = ArrayD::from_shape_vec(IxDyn(&[2, 1, 1]), vec![1.5, 2.0]).unwrap();
        let coords = AbsoluteCoords::from_raw(data);
        let out = map_coordinates(img.view(), &coords, 1, BoundaryMode::Nearest, 0.0);
        // (1.5, 2.0) 介于 img[1,2]=7 与 img[2,2]=12 之间.
        assert!(float_eq(out[[0, 0]], 9.5));
    }

    /// Constant 模式下, 完全越界的坐标取填充值.
    #[test]
    fn test_constant_fill() {
        let img = demo_img();
        let data = ArrayD::from_shape_vec(IxDyn(&[2, 1, 1]), vec![-10.0, -10.0]).unwrap();
        let coords = AbsoluteCoords::from_raw(data);
        let out = map_coordinates(img.view(), &coords, 1, BoundaryMode::Constant, -7.0);
        assert!(float_eq(out[[0, 0]], -7.0));
    }

    /// Nearest 模式把越界坐标钳制到边缘.
    #[test]
    fn test_nearest_clamp() {
        let img = demo_img();
        let data = ArrayD::from_shape_vec(IxDyn(&[2, 1, 1]), vec![100.0, 100.0]).unwrap();
        let coords = AbsoluteCoords::from_raw(data);
        let out = map_coordinates(img.view(), &coords, 0, BoundaryMode::Nearest, 0.0);
        assert!(float_eq(out[[0, 0]], 19.0)); // img[3, 4]
    }

    /// 同形状缩放是恒等变换 (中心对齐映射在同形状下恰为索引网格).
    #[test]
    fn test_resize_identity() {
        let img = demo_img();
        for order in [0u8, 1, 3] {
            let out = resize(img.view(), &[4, 5], order, BoundaryMode::Constant, 0.0, true);
            assert!(img.iter().zip(out.iter()).all(|(a, b)| float_eq(*a, *b)));
        }
    }

    /// 放大后的输出被钳制在源值域内.
    #[test]
    fn test_resize_clip_range() {
        let img = demo_img();
        let out = resize(img.view(), &[13, 17], 3, BoundaryMode::Constant, 0.0, true);
        assert_eq!(out.shape(), &[13, 17]);
        assert!(out.iter().all(|&v| (0.0..=19.0).contains(&v)));
    }

    /// 最近邻收集式缩放: 整数倍放大是块复制.
    #[test]
    fn test_resize_nearest_block() {
        let img = ArrayD::from_shape_vec(IxDyn(&[2, 2]), vec![1u8, 2, 3, 4]).unwrap();
        let out = resize_nearest(img.view(), &[4, 4]);
        assert_eq!(out[[0, 0]], 1);
        assert_eq!(out[[0, 3]], 2);
        assert_eq!(out[[3, 0]], 3);
        assert_eq!(out[[3, 3]], 4);
    }

    /// 秩不匹配必须 panic.
    #[test]
    #[should_panic]
    fn test_rank_mismatch() {
        let img = demo_img();
        let coords = AbsoluteCoords::index_mesh(&[4, 5, 6]);
        let _ = map_coordinates(img.view(), &coords, 1, BoundaryMode::Nearest, 0.0);
    }

    /// 非法插值阶数必须 panic.
    #[test]
    #[should_panic]
    fn test_bad_order() {
        let img = demo_img();
        let coords = AbsoluteCoords::index_mesh(&[4, 5]);
        let _ = map_coordinates(img.view(), &coords, 6, BoundaryMode::Nearest, 0.0);
    }
}
