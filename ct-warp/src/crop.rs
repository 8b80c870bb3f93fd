//! 裁剪与填充.
//!
//! 没有数值上的微妙之处, 只有索引计算: 中心裁剪, 随机裁剪,
//! 以及把图像居中放入更大画布的填充.

use crate::RandomSource;
use ndarray::{ArrayD, ArrayViewD, IxDyn, Slice};

/// 把标量或逐轴裁剪尺寸解析为逐轴向量.
fn resolve_crop_size(crop_size: &[usize], ndim: usize) -> Vec<usize> {
    if crop_size.len() == 1 {
        vec![crop_size[0]; ndim]
    } else {
        assert_eq!(
            crop_size.len(),
            ndim,
            "若以序列给定裁剪尺寸, 其长度 {} 必须等于图像维数 {}",
            crop_size.len(),
            ndim
        );
        crop_size.to_vec()
    }
}

/// 中心裁剪. `crop_size` 为单元素时广播到所有轴.
///
/// 裁剪尺寸不得超过对应维长, 否则 panic.
pub fn center_crop<T: Copy>(img: ArrayViewD<'_, T>, crop_size: &[usize]) -> ArrayD<T> {
    let sizes = resolve_crop_size(crop_size, img.ndim());
    let starts: Vec<usize> = sizes
        .iter()
        .zip(img.shape())
        .map(|(&size, &extent)| {
            assert!(
                size <= extent,
                "裁剪尺寸 {size} 超过了图像对应维长 {extent}"
            );
            (extent as f64 / 2.0 - size as f64 / 2.0) as usize
        })
        .collect();

    img.slice_each_axis(|ad| {
        let d = ad.axis.index();
        Slice::from(starts[d]..starts[d] + sizes[d])
    })
    .to_owned()
}

/// 随机裁剪. 每个轴的起点在合法范围内均匀抽取.
pub fn random_crop<T: Copy>(
    img: ArrayViewD<'_, T>,
    crop_size: &[usize],
    rng: &mut RandomSource,
) -> ArrayD<T> {
    let sizes = resolve_crop_size(crop_size, img.ndim());
    let starts: Vec<usize> = sizes
        .iter()
        .zip(img.shape())
        .map(|(&size, &extent)| {
            assert!(
                size <= extent,
                "裁剪尺寸 {size} 超过了图像对应维长 {extent}"
            );
            if size < extent {
                rng.index(extent - size)
            } else {
                0
            }
        })
        .collect();

    img.slice_each_axis(|ad| {
        let d = ad.axis.index();
        Slice::from(starts[d]..starts[d] + sizes[d])
    })
    .to_owned()
}

/// 居中填充到目标形状. 实际输出形状是新旧形状的逐轴最大值,
/// 因此该操作从不丢弃数据. 填充值缺省取图像角点元素.
pub fn pad_to_shape<T: Copy>(
    img: ArrayViewD<'_, T>,
    new_shape: &[usize],
    pad_value: Option<T>,
) -> ArrayD<T> {
    assert_eq!(
        new_shape.len(),
        img.ndim(),
        "目标形状秩 {} 与图像秩 {} 不一致",
        new_shape.len(),
        img.ndim()
    );
    assert!(!img.is_empty(), "空图像无法确定缺省填充值");

    let target: Vec<usize> = new_shape
        .iter()
        .zip(img.shape())
        .map(|(&n, &o)| n.max(o))
        .collect();
    let value = pad_value.unwrap_or_else(|| img[IxDyn(&vec![0; img.ndim()])]);

    let mut out = ArrayD::from_elem(IxDyn(&target), value);
    let starts: Vec<usize> = target
        .iter()
        .zip(img.shape())
        .map(|(&t, &o)| (t as f64 / 2.0 - o as f64 / 2.0) as usize)
        .collect();

    out.slice_each_axis_mut(|ad| {
        let d = ad.axis.index();
        Slice::from(starts[d]..starts[d] + img.shape()[d])
    })
    .assign(&img);
    out
}

#[cfg(test)]
mod tests {
    use super::{center_crop, pad_to_shape, random_crop};
    use crate::RandomSource;
    use ndarray::{ArrayD, IxDyn};

    fn demo() -> ArrayD<i32> {
        ArrayD::from_shape_fn(IxDyn(&[6, 6]), |i| (i[0] * 6 + i[1]) as i32)
    }

    /// 中心裁剪取几何中央的子块.
    #[test]
    fn test_center_crop() {
        let img = demo();
        let out = center_crop(img.view(), &[2, 4]);
        assert_eq!(out.shape(), &[2, 4]);
        assert_eq!(out[[0, 0]], img[[2, 1]]);
    }

    /// 裁剪尺寸等于图像时, 随机裁剪是恒等.
    #[test]
    fn test_random_crop_full_size() {
        let img = demo();
        let mut rng = RandomSource::from_seed(9);
        let out = random_crop(img.view(), &[6], &mut rng);
        assert_eq!(out, img);
    }

    /// 随机裁剪的内容总是源图的连续子块.
    #[test]
    fn test_random_crop_contents() {
        let img = demo();
        let mut rng = RandomSource::from_seed(10);
        for _ in 0..16 {
            let out = random_crop(img.view(), &[3, 3], &mut rng);
            let anchor = out[[0, 0]];
            let (r, c) = ((anchor / 6) as usize, (anchor % 6) as usize);
            assert_eq!(out[[2, 2]], img[[r + 2, c + 2]]);
        }
    }

    /// 填充把原图放在画布中央, 周围是填充值.
    #[test]
    fn test_pad_centered() {
        let img = ArrayD::from_elem(IxDyn(&[2, 2]), 7i32);
        let out = pad_to_shape(img.view(), &[4, 4], Some(0));
        assert_eq!(out.shape(), &[4, 4]);
        assert_eq!(out[[1, 1]], 7);
        assert_eq!(out[[2, 2]], 7);
        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[3, 3]], 0);
    }

    /// 目标形状小于原图时不丢数据 (逐轴取最大).
    #[test]
    fn test_pad_never_shrinks() {
        let img = demo();
        let out = pad_to_shape(img.view(), &[3, 9], None);
        assert_eq!(out.shape(), &[6, 9]);
    }

    /// 过大的裁剪尺寸必须 panic.
    #[test]
    #[should_panic]
    fn test_crop_too_large() {
        let img = demo();
        let _ = center_crop(img.view(), &[7, 3]);
    }
}
