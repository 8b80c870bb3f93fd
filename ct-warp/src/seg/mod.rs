//! 分割标签图的转换与缩放.
//!
//! 核心不变量: 缩放一张标签图绝不产生原图中不存在的类别值.
//! 对 0 阶 (最近邻) 缩放, 该性质由收集式采样天然保证;
//! 对高阶缩放, 通过 one-hot 展开 + 逐类插值 + argmax 折叠实现.

use crate::error::AugError;
use crate::filter::BoundaryMode;
use crate::interp::{resize, resize_nearest};
use ndarray::{ArrayD, ArrayViewD, Axis, Dimension, IxDyn};
use ordered_float::OrderedFloat;
#[cfg(feature = "rayon")]
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use std::collections::BTreeSet;

pub mod bbox;

/// 返回标签图中出现过的全部类别值, 升序排列.
pub fn unique_labels<T: Copy + Ord>(seg: ArrayViewD<'_, T>) -> Vec<T> {
    seg.iter().copied().collect::<BTreeSet<T>>().into_iter().collect()
}

/// 标签图 -> one-hot 栈.
///
/// `classes` 给出通道顺序; 为 `None` 时取图中升序排列的全部类别值.
/// 输出形状 `[n_classes, *spatial]`, 每个通道是对应类别值的精确相等掩膜.
pub fn one_hot_encode<T: Copy + Ord>(
    seg: ArrayViewD<'_, T>,
    classes: Option<&[T]>,
) -> ArrayD<u8> {
    let owned;
    let classes = match classes {
        Some(c) => c,
        None => {
            owned = unique_labels(seg.view());
            &owned
        }
    };

    let mut full = Vec::with_capacity(seg.ndim() + 1);
    full.push(classes.len());
    full.extend_from_slice(seg.shape());

    let mut out = ArrayD::<u8>::zeros(IxDyn(&full));
    for (i, &c) in classes.iter().enumerate() {
        out.index_axis_mut(Axis(0), i)
            .zip_mut_with(&seg, |o, s| {
                if *s == c {
                    *o = 1;
                }
            });
    }
    out
}

/// one-hot 栈 -> 标签图: 逐位置对通道取 argmax (并列取最小通道索引),
/// 再查出类别值. 对编码器的输出, 该操作是精确逆.
pub fn one_hot_decode<T: Copy>(
    stack: ArrayViewD<'_, u8>,
    classes: &[T],
) -> Result<ArrayD<T>, AugError> {
    if classes.is_empty() {
        return Err(AugError::EmptyClassList);
    }
    assert_eq!(
        stack.len_of(Axis(0)),
        classes.len(),
        "one-hot 栈通道数 {} 与类别个数 {} 不一致",
        stack.len_of(Axis(0)),
        classes.len()
    );

    let spatial = stack.shape()[1..].to_vec();
    let channels: Vec<_> = stack.axis_iter(Axis(0)).collect();
    Ok(ArrayD::from_shape_fn(IxDyn(&spatial), |idx| {
        let mut best = 0usize;
        let mut best_v = channels[0][idx.slice()];
        for (i, ch) in channels.iter().enumerate().skip(1) {
            let v = ch[idx.slice()];
            if v > best_v {
                best_v = v;
                best = i;
            }
        }
        classes[best]
    }))
}

/// 标签安全的分割缩放.
///
/// `order == 0` 时直接做最近邻收集式缩放 (天然标签安全);
/// `order > 0` 时枚举原图类别, 逐类构造指示图, 以请求的阶数缩放并
/// 四舍五入为二值, 最后 argmax 折叠回标签图.
///
/// 保证: 输出值是原类别集合的子集; 输出元素类型与输入一致.
pub fn resize_segmentation<T: Copy + Ord>(
    seg: ArrayViewD<'_, T>,
    new_shape: &[usize],
    order: u8,
) -> ArrayD<T> {
    assert_eq!(
        seg.ndim(),
        new_shape.len(),
        "新形状秩 {} 与分割图秩 {} 不一致",
        new_shape.len(),
        seg.ndim()
    );
    assert!(!seg.is_empty(), "分割图不能为空");

    if order == 0 {
        return resize_nearest(seg, new_shape);
    }

    let classes = unique_labels(seg.view());
    let channels: Vec<ArrayD<f64>> = classes
        .iter()
        .map(|&c| {
            let indicator = seg.mapv(|v| if v == c { 1.0 } else { 0.0 });
            let mut resized = resize(
                indicator.view(),
                new_shape,
                order,
                BoundaryMode::Constant,
                0.0,
                true,
            );
            resized.mapv_inplace(f64::round);
            resized
        })
        .collect();

    ArrayD::from_shape_fn(IxDyn(new_shape), |idx| {
        let mut best = 0usize;
        let mut best_v = OrderedFloat(f64::NEG_INFINITY);
        for (i, ch) in channels.iter().enumerate() {
            let v = OrderedFloat(ch[idx.slice()]);
            if v > best_v {
                best_v = v;
                best = i;
            }
        }
        classes[best]
    })
}

/// 逐通道缩放 softmax 概率体.
///
/// 输入形状 `[C, *shape]`; 每个通道独立地以请求的阶数缩放
/// (常数边界, 填充 0, 钳制值域), 按原通道顺序重组.
pub fn resize_softmax(
    softmax: ArrayViewD<'_, f64>,
    new_shape: &[usize],
    order: u8,
) -> ArrayD<f64> {
    assert_eq!(
        softmax.ndim(),
        new_shape.len() + 1,
        "概率体秩 {} 应为新空间形状秩 {} 加一个通道维",
        softmax.ndim(),
        new_shape.len()
    );

    let n_channels = softmax.len_of(Axis(0));
    let mut full = Vec::with_capacity(new_shape.len() + 1);
    full.push(n_channels);
    full.extend_from_slice(new_shape);

    let mut out = ArrayD::<f64>::zeros(IxDyn(&full));
    for (c, channel) in softmax.axis_iter(Axis(0)).enumerate() {
        let resized = resize(
            channel,
            new_shape,
            order,
            BoundaryMode::Constant,
            0.0,
            true,
        );
        out.index_axis_mut(Axis(0), c).assign(&resized);
    }
    out
}

/// [`resize_softmax`] 的多线程版本. 各通道彼此独立, 借助 `rayon` 并行缩放.
#[cfg(feature = "rayon")]
pub fn par_resize_softmax(
    softmax: ArrayViewD<'_, f64>,
    new_shape: &[usize],
    order: u8,
) -> ArrayD<f64> {
    assert_eq!(
        softmax.ndim(),
        new_shape.len() + 1,
        "概率体秩 {} 应为新空间形状秩 {} 加一个通道维",
        softmax.ndim(),
        new_shape.len()
    );

    let channels: Vec<_> = softmax.axis_iter(Axis(0)).collect();
    let resized: Vec<ArrayD<f64>> = channels
        .into_par_iter()
        .map(|channel| resize(channel, new_shape, order, BoundaryMode::Constant, 0.0, true))
        .collect();

    let mut full = Vec::with_capacity(new_shape.len() + 1);
    full.push(resized.len());
    full.extend_from_slice(new_shape);

    let mut out = ArrayD::<f64>::zeros(IxDyn(&full));
    for (c, channel) in resized.into_iter().enumerate() {
        out.index_axis_mut(Axis(0), c).assign(&channel);
    }
    out
}
