//! 运行时错误.

/// 强度归一化与重采样配置的运行时错误.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AugError {
    /// 不支持的高斯导数阶. 目前只支持 0 (平滑) 和 1 (梯度幅值).
    UnsupportedDiffOrder(u8),

    /// 类别列表为空, 无法完成 one-hot 折叠.
    EmptyClassList,
}

impl std::fmt::Display for AugError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedDiffOrder(o) => {
                write!(f, "diff_order 只能为 0 或 1, 实际为 {o}")
            }
            Self::EmptyClassList => write!(f, "类别列表为空"),
        }
    }
}

impl std::error::Error for AugError {}
