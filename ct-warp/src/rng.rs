//! 可注入的随机源.
//!
//! 所有随机化操作显式接受 `&mut RandomSource`, 而不是读取进程级全局状态.
//! 这样每个 worker 可以持有自己的独立流, 种子由调用者管理.

use ndarray::{ArrayD, IxDyn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 标量或区间. 区间两端相等时退化为标量, 不消耗随机数.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RangeVal {
    /// 固定值, 原样返回.
    Exact(f64),

    /// 抽取区间. uniform 抽法下为 `[low, high)`;
    /// normal 抽法下两个分量分别为均值和标准差.
    Range(f64, f64),
}

/// 区间抽取方式.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SamplingKind {
    /// 均匀分布.
    Uniform,

    /// 正态分布.
    Normal,
}

/// 随机源. 内部为可播种的 ChaCha8 流.
#[derive(Clone, Debug)]
pub struct RandomSource {
    inner: ChaCha8Rng,
}

impl RandomSource {
    /// 以 64 位种子构建确定性随机源. 相同种子产生相同序列.
    #[inline]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// 以系统熵构建随机源.
    #[inline]
    pub fn from_entropy() -> Self {
        Self {
            inner: ChaCha8Rng::from_entropy(),
        }
    }

    /// 抽取 `[0, 1)` 内的均匀浮点数.
    #[inline]
    pub fn unit(&mut self) -> f64 {
        self.inner.gen::<f64>()
    }

    /// 抽取 `[low, high)` 内的均匀浮点数. `low == high` 时直接返回 `low`.
    #[inline]
    pub fn uniform(&mut self, low: f64, high: f64) -> f64 {
        assert!(low <= high, "uniform 区间下界 {low} 大于上界 {high}");
        if low == high {
            low
        } else {
            self.inner.gen_range(low..high)
        }
    }

    /// 抽取均值 `mean`, 标准差 `sd` 的正态变量. `sd == 0` 时返回 `mean`.
    #[inline]
    pub fn normal(&mut self, mean: f64, sd: f64) -> f64 {
        assert!(sd >= 0.0, "正态分布标准差必须非负, 实际为 {sd}");
        if sd == 0.0 {
            mean
        } else {
            // 参数已验证, 构造不会失败.
            Normal::new(mean, sd).unwrap().sample(&mut self.inner)
        }
    }

    /// 抽取 `[0, upper)` 内的均匀整数. `upper` 必须为正.
    #[inline]
    pub fn index(&mut self, upper: usize) -> usize {
        assert!(upper > 0, "index 的上界必须为正");
        self.inner.gen_range(0..upper)
    }

    /// 标量/区间采样. 标量原样返回; 区间按 `kind` 抽取,
    /// 区间两端相等时退化为标量 (不消耗随机数).
    pub fn sample_range(&mut self, value: RangeVal, kind: SamplingKind) -> f64 {
        match value {
            RangeVal::Exact(v) => v,
            RangeVal::Range(a, b) if a == b => a,
            RangeVal::Range(a, b) => match kind {
                SamplingKind::Uniform => self.uniform(a, b),
                SamplingKind::Normal => self.normal(a, b),
            },
        }
    }

    /// 生成形状为 `shape`, 值在 `[-1, 1]` 内的均匀噪声数组.
    pub fn unit_noise(&mut self, shape: &[usize]) -> ArrayD<f64> {
        let len: usize = shape.iter().product();
        let data: Vec<f64> = (0..len).map(|_| self.unit() * 2.0 - 1.0).collect();

        // 元素个数与形状一致, 不会失败.
        ArrayD::from_shape_vec(IxDyn(shape), data).unwrap()
    }
}
