#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供 2D/3D 医学图像体数据及其配对分割标签的几何/强度增强原语.
//!
//! 该 crate 的职责是纯数值的: 给定数组形式的图像/体数据, 产生确定或随机的
//! 几何重采样 (弹性形变, 旋转, 缩放, 裁剪, 填充), 强度归一化,
//! 标签到 one-hot 的转换, 以及从分割掩膜提取包围盒.
//!
//! # 注意
//!
//! 1. 所有操作均为同步的纯函数, 返回新数组, 从不修改调用者的缓冲区.
//! 2. 在非期望情况下 (如参数秩不匹配), 程序会直接 panic,
//!    而不会导致内存错误. As what Rust promises.
//! 3. 随机化操作显式接受 [`RandomSource`], 不存在进程级全局随机状态.
//!    可复现性由调用者持有的种子决定.
//!
//! # 功能一览
//!
//! ### 坐标场与几何变换 ✅
//!
//! 零中心坐标网格, 2D/3D 旋转矩阵 (按 x -> y -> z 固定顺序复合),
//! 各向/逐轴缩放, 弹性形变场. 零中心空间与绝对索引空间由两个独立类型表示
//! ([`CenteredCoords`], [`AbsoluteCoords`]), 二者之间只能通过
//! `recenter` 显式转换.
//!
//! 实现位于 `ct-warp/src/coords`.
//!
//! ### 插值重采样 ✅
//!
//! 在任意 (可能是小数的) 坐标处采样数组, 插值阶数 0 (最近邻), 1 (多重线性),
//! 2..=5 (三次样条型). 越界策略支持边缘钳制与常数填充.
//!
//! 实现位于 `ct-warp/src/interp.rs`.
//!
//! ### 标签安全的分割缩放 ✅
//!
//! 通过 one-hot 展开, 逐类插值与 argmax 折叠, 保证缩放后的标签图
//! 不引入原图中不存在的类别值.
//!
//! 实现位于 `ct-warp/src/seg`.
//!
//! ### 包围盒提取 ✅
//!
//! 对分割掩膜批做连通域标记, 逐实例产生轴对齐包围盒 (各轴向外扩 1),
//! 实例掩膜和类别 id.
//!
//! 实现位于 `ct-warp/src/seg/bbox.rs`.
//!
//! ### 高斯滤波后端 ✅
//!
//! 可分离高斯平滑与梯度幅值, 供弹性形变与强度归一化使用.
//!
//! 实现位于 `ct-warp/src/filter.rs`.
//!
//! ### 强度操作 ✅
//!
//! 光照抖动与 Mink 范数颜色恒常性归一化.
//!
//! 实现位于 `ct-warp/src/intensity.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 中心/随机裁剪与居中填充. ✅
//! 2. 标量/区间采样工具 (uniform 与 normal 两种抽法). ✅

/// 二维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx2d = (usize, usize);

/// 三维索引, 同时也可一定程度上用作非负整数向量.
pub type Idx3d = (usize, usize, usize);

pub mod consts;

mod error;

pub use error::AugError;

pub mod coords;

pub use coords::{AbsoluteCoords, CenteredCoords};

pub mod filter;

pub use filter::BoundaryMode;

pub mod interp;

pub mod seg;

pub use seg::bbox::{BoundingBoxBatch, NonzeroGating};

pub mod crop;

pub mod intensity;

mod rng;

pub use rng::{RandomSource, RangeVal, SamplingKind};

pub mod prelude;
