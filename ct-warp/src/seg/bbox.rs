//! 从分割掩膜批提取逐实例包围盒.
//!
//! 对批中每个样本做连通域标记 (正交邻接, 即 2D 4-邻域 / 3D 6-邻域),
//! 按连通域标号顺序截断到最多 `n_max_gt` 个实例. 每个保留实例产生:
//!
//! 1. 紧包围盒, 每轴向外扩 1 (低界 -1, 高界 +1);
//! 2. 二值实例掩膜;
//! 3. 类别 id = 样本类别 + 1 (0 保留给背景).

use crate::consts::DEFAULT_N_MAX_GT;
use log::warn;
use ndarray::{Array2, Array3, ArrayD, ArrayViewD, Axis, Dimension, IxDyn};
use num::Zero;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt::Display;

/// 非零门控策略.
///
/// 原始实现在整个批张量上做非零检查, 而不是逐样本 —
/// 这会把空样本的诊断与批中其它样本耦合. 该行为被保留为
/// [`Self::WholeBatch`]; [`Self::PerSample`] 是修正后的逐样本检查.
/// 两种策略下, 被跳过的样本均只发出诊断日志并留下全零行.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NonzeroGating {
    /// 原始行为: 只要整个批中存在非零体素, 每个样本都进入标记流程
    /// (空样本自然产生零个连通域); 整批全零时逐样本发出诊断.
    WholeBatch,

    /// 修正行为: 每个样本独立检查, 空样本跳过并发出诊断.
    PerSample,
}

/// 包围盒提取结果. 各数组的第 0 维是批, 第 1 维是实例槽位;
/// 未被填充的槽位保持全零.
#[derive(Clone, Debug)]
pub struct BoundingBoxBatch {
    /// `(B, n_max_gt, 2 * dim)`. 2D 为 `[min1-1, min0-1, max1+1, max0+1]`
    /// (第 1 轴在前, 与原始列序一致), 3D 在末尾追加 `[min2-1, max2+1]`.
    pub boxes: Array3<f64>,

    /// `(B, n_max_gt, *spatial)` 二值实例掩膜.
    pub masks: ArrayD<u8>,

    /// `(B, n_max_gt)` 类别 id, 即样本类别 + 1.
    pub class_ids: Array2<i64>,
}

/// 正交邻接连通域标记. 非零元素为前景, 返回 (标号数组, 连通域个数),
/// 标号从 1 开始按扫描顺序分配.
pub fn label_components<T>(mask: ArrayViewD<'_, T>) -> (ArrayD<u32>, u32)
where
    T: Copy + PartialEq + Zero,
{
    let shape = mask.shape().to_vec();
    let mut labels = ArrayD::<u32>::zeros(mask.raw_dim());
    let mut count = 0u32;
    let mut queue: VecDeque<Vec<usize>> = VecDeque::new();

    for (idx, v) in mask.indexed_iter() {
        if v.is_zero() || labels[idx.slice()] != 0 {
            continue;
        }

        // 发现新连通域, 广度优先洪泛.
        count += 1;
        labels[idx.slice()] = count;
        queue.push_back(idx.slice().to_vec());

        while let Some(pos) = queue.pop_front() {
            for d in 0..shape.len() {
                for delta in [-1isize, 1] {
                    let moved = pos[d] as isize + delta;
                    if moved < 0 || moved as usize >= shape[d] {
                        continue;
                    }
                    let mut neigh = pos.clone();
                    neigh[d] = moved as usize;
                    if !mask[neigh.as_slice()].is_zero() && labels[neigh.as_slice()] == 0 {
                        labels[neigh.as_slice()] = count;
                        queue.push_back(neigh);
                    }
                }
            }
        }
    }
    (labels, count)
}

/// 从分割掩膜批提取逐实例包围盒, 实例掩膜与类别 id.
///
/// `seg` 形状为 `[B, *spatial]`, 空间维数必须为 2 或 3;
/// `class_targets` 与 `sample_ids` 长度必须等于 B.
/// `n_max_gt` 为 `None` 时取 [`DEFAULT_N_MAX_GT`].
/// 被门控跳过的样本发出 `warn!` 诊断 (指明样本 id), 其输出行保持全零;
/// 调用方必须容忍全零行.
pub fn seg_to_bounding_boxes<T, I>(
    seg: ArrayViewD<'_, T>,
    class_targets: &[i64],
    sample_ids: &[I],
    n_max_gt: Option<usize>,
    gating: NonzeroGating,
) -> BoundingBoxBatch
where
    T: Copy + PartialEq + Zero,
    I: Display,
{
    let n_max_gt = n_max_gt.unwrap_or(DEFAULT_N_MAX_GT);
    let dim = seg.ndim() - 1;
    assert!(
        dim == 2 || dim == 3,
        "分割批空间维数只能为 2 或 3, 实际为 {dim}"
    );
    let batch = seg.len_of(Axis(0));
    assert_eq!(
        class_targets.len(),
        batch,
        "类别标签个数 {} 与批大小 {} 不一致",
        class_targets.len(),
        batch
    );
    assert_eq!(
        sample_ids.len(),
        batch,
        "样本 id 个数 {} 与批大小 {} 不一致",
        sample_ids.len(),
        batch
    );

    let spatial = seg.shape()[1..].to_vec();
    let mut mask_shape = Vec::with_capacity(dim + 2);
    mask_shape.push(batch);
    mask_shape.push(n_max_gt);
    mask_shape.extend_from_slice(&spatial);

    let mut boxes = Array3::<f64>::zeros((batch, n_max_gt, 2 * dim));
    let mut masks = ArrayD::<u8>::zeros(IxDyn(&mask_shape));
    let mut class_ids = Array2::<i64>::zeros((batch, n_max_gt));

    let batch_nonzero = seg.iter().any(|v| !v.is_zero());

    for b in 0..batch {
        let sample = seg.index_axis(Axis(0), b);
        let pass = match gating {
            NonzeroGating::WholeBatch => batch_nonzero,
            NonzeroGating::PerSample => sample.iter().any(|v| !v.is_zero()),
        };
        if !pass {
            warn!(
                "包围盒被增强挤出图像, 跳过样本 {} (类别 {})",
                sample_ids[b], class_targets[b]
            );
            continue;
        }

        let (labels, n_comp) = label_components(sample);
        let retained = (n_comp as usize).min(n_max_gt);

        for rix in 0..retained {
            let comp = rix as u32 + 1;
            let mut mins = vec![usize::MAX; dim];
            let mut maxs = vec![0usize; dim];

            let mut instance = masks
                .view_mut()
                .index_axis_move(Axis(0), b)
                .index_axis_move(Axis(0), rix);
            for (idx, &l) in labels.indexed_iter() {
                if l != comp {
                    continue;
                }
                for d in 0..dim {
                    mins[d] = mins[d].min(idx[d]);
                    maxs[d] = maxs[d].max(idx[d]);
                }
                instance[idx.slice()] = 1;
            }

            // 每轴向外扩 1. 低界可以为 -1, 因此用浮点存储.
            let mut coord_list = vec![
                mins[1] as f64 - 1.0,
                mins[0] as f64 - 1.0,
                maxs[1] as f64 + 1.0,
                maxs[0] as f64 + 1.0,
            ];
            if dim == 3 {
                coord_list.push(mins[2] as f64 - 1.0);
                coord_list.push(maxs[2] as f64 + 1.0);
            }
            for (k, v) in coord_list.into_iter().enumerate() {
                boxes[[b, rix, k]] = v;
            }
            class_ids[[b, rix]] = class_targets[b] + 1;
        }
    }

    BoundingBoxBatch {
        boxes,
        masks,
        class_ids,
    }
}

#[cfg(test)]
mod tests {
    use super::{label_components, seg_to_bounding_boxes, NonzeroGating};
    use ndarray::{ArrayD, IxDyn};

    /// 斜对角的两个点不正交相邻, 必须分为两个连通域.
    #[test]
    fn test_label_orthogonal_connectivity() {
        let mut mask = ArrayD::<u8>::zeros(IxDyn(&[4, 4]));
        mask[[1, 1]] = 1;
        mask[[2, 2]] = 1;
        let (labels, n) = label_components(mask.view());
        assert_eq!(n, 2);
        assert_ne!(labels[[1, 1]], labels[[2, 2]]);
    }

    /// 实心块是单个连通域.
    #[test]
    fn test_label_solid_block() {
        let mut mask = ArrayD::<u8>::zeros(IxDyn(&[5, 5, 5]));
        for z in 1..4 {
            for h in 1..4 {
                for w in 1..4 {
                    mask[[z, h, w]] = 1;
                }
            }
        }
        let (labels, n) = label_components(mask.view());
        assert_eq!(n, 1);
        assert_eq!(labels[[2, 2, 2]], 1);
    }

    /// 已知偏移的 3x3 实心方块: 包围盒必须精确等于
    /// `[min_col-1, min_row-1, max_col+1, max_row+1]`.
    #[test]
    fn test_box_expansion_exact() {
        let mut seg = ArrayD::<u8>::zeros(IxDyn(&[1, 8, 8]));
        for r in 2..5 {
            for c in 3..6 {
                seg[[0, r, c]] = 1;
            }
        }
        let out = seg_to_bounding_boxes(
            seg.view(),
            &[0],
            &["case_0"],
            None,
            NonzeroGating::WholeBatch,
        );

        let b: Vec<f64> = (0..4).map(|k| out.boxes[[0, 0, k]]).collect();
        assert_eq!(b, vec![2.0, 1.0, 6.0, 5.0]);
        assert_eq!(out.class_ids[[0, 0]], 1);
        assert_eq!(out.masks[[0, 0, 3, 4]], 1);
        assert_eq!(out.masks[[0, 0, 0, 0]], 0);
    }

    /// 3D 包围盒追加第三轴界, 且低界扩到 -1 也被保留.
    #[test]
    fn test_box_3d_bounds() {
        let mut seg = ArrayD::<u8>::zeros(IxDyn(&[1, 4, 4, 4]));
        seg[[0, 0, 1, 2]] = 1;
        let out =
            seg_to_bounding_boxes(seg.view(), &[2], &[7u32], None, NonzeroGating::PerSample);

        let b: Vec<f64> = (0..6).map(|k| out.boxes[[0, 0, k]]).collect();
        // 轴序: [min1-1, min0-1, max1+1, max0+1, min2-1, max2+1].
        assert_eq!(b, vec![0.0, -1.0, 2.0, 1.0, 1.0, 3.0]);
        assert_eq!(out.class_ids[[0, 0]], 3);
    }

    /// 实例个数超过 `n_max_gt` 时按标号顺序截断.
    #[test]
    fn test_truncate_to_n_max_gt() {
        let mut seg = ArrayD::<u8>::zeros(IxDyn(&[1, 3, 9]));
        for c in [0usize, 2, 4, 6, 8] {
            seg[[0, 1, c]] = 1;
        }
        let out = seg_to_bounding_boxes(
            seg.view(),
            &[0],
            &["case_1"],
            Some(3),
            NonzeroGating::PerSample,
        );

        let filled = (0..3)
            .filter(|&r| out.class_ids[[0, r]] != 0)
            .count();
        assert_eq!(filled, 3);
    }

    /// WholeBatch 门控: 非空批中的空样本静默产生全零行;
    /// PerSample 门控产生同样的全零行 (但带诊断).
    #[test]
    fn test_gating_variants() {
        let mut seg = ArrayD::<u8>::zeros(IxDyn(&[2, 4, 4]));
        seg[[0, 1, 1]] = 1; // 样本 0 非空, 样本 1 全零.

        for gating in [NonzeroGating::WholeBatch, NonzeroGating::PerSample] {
            let out = seg_to_bounding_boxes(seg.view(), &[0, 1], &["a", "b"], Some(2), gating);
            assert_eq!(out.class_ids[[0, 0]], 1);
            // 样本 1 的所有输出行保持全零.
            assert!((0..2).all(|r| out.class_ids[[1, r]] == 0));
            assert!((0..4).all(|k| out.boxes[[1, 0, k]] == 0.0));
        }
    }

    /// `n_max_gt` 缺省时实例槽位数为 [`crate::consts::DEFAULT_N_MAX_GT`].
    #[test]
    fn test_default_slot_count() {
        let mut seg = ArrayD::<u8>::zeros(IxDyn(&[1, 4, 4]));
        seg[[0, 0, 0]] = 1;
        let out =
            seg_to_bounding_boxes(seg.view(), &[0], &["a"], None, NonzeroGating::PerSample);
        assert_eq!(out.class_ids.shape(), &[1, crate::consts::DEFAULT_N_MAX_GT]);
        assert_eq!(out.boxes.shape(), &[1, crate::consts::DEFAULT_N_MAX_GT, 4]);
    }

    /// 整批全零: 两种门控下所有行都是全零.
    #[test]
    fn test_all_zero_batch() {
        let seg = ArrayD::<u8>::zeros(IxDyn(&[2, 4, 4]));
        for gating in [NonzeroGating::WholeBatch, NonzeroGating::PerSample] {
            let out = seg_to_bounding_boxes(seg.view(), &[0, 0], &["a", "b"], Some(2), gating);
            assert!(out.boxes.iter().all(|&v| v == 0.0));
            assert!(out.masks.iter().all(|&v| v == 0));
            assert!(out.class_ids.iter().all(|&v| v == 0));
        }
    }
}
