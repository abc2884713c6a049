//! 运行时错误.

use crate::Idx2d;
use thiserror::Error;

/// 拟合、曲率计算以及像素化过程中的运行时错误.
///
/// 数值退化 (例如曲率公式中分母为 0) **不是** 错误, 它会按照 IEEE 浮点语义
/// 以 `NaN` / `inf` 的形式传递给调用者.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// 两组坐标的长度不一致.
    ///
    /// 第一个参数是 x 坐标 (或点) 的个数, 第二个参数是 y 坐标 (或误差) 的个数.
    #[error("x 与 y 的点数必须相同: x 有 {0} 个点, y 有 {1} 个点")]
    ShapeMismatch(usize, usize),

    /// 参与角度计算的向量为零向量.
    #[error("零向量没有方向")]
    ZeroVector,

    /// 点数不足以拟合给定阶数的样条.
    ///
    /// 第一个参数代表目前已有的点, 第二个参数代表实际拟合需要的最少点数.
    #[error("点数不足: 已有 {0} 个点, 至少需要 {1} 个")]
    TooFewPoints(usize, usize),

    /// 样条阶数不在 `1..=5` 之内.
    #[error("样条阶数 {0} 不受支持")]
    InvalidOrder(usize),

    /// 求导次数超过样条阶数. `(nu, k)`
    #[error("无法对 {1} 阶样条求 {0} 阶导数")]
    DerivativeTooHigh(usize, usize),

    /// 点误差必须是有限正数.
    #[error("点误差必须为有限正数, 实际为 {0}")]
    InvalidPointError(f64),

    /// 平滑因子必须是有限非负数.
    #[error("平滑因子必须为有限非负数, 实际为 {0}")]
    InvalidSmoothing(f64),

    /// 点数组不是 `(n, 2)` 形状. 参数为实际列数.
    #[error("点数组必须有 2 列, 实际为 {0} 列")]
    NotPointArray(usize),

    /// 第 `.0` 个点的坐标不是有限值, 或截断后为负.
    #[error("第 {0} 个点的坐标无法映射到像素网格")]
    InvalidCoordinate(usize),

    /// 两个掩膜的形状不同.
    #[error("掩膜形状不一致: {0:?} 与 {1:?}")]
    GridShapeMismatch(Idx2d, Idx2d),

    /// 网格文本中出现了非整数内容.
    #[error("无法解析网格元素 `{0}`")]
    BadGridToken(String),

    /// 网格文本各行长度不一致.
    #[error("网格第 {row} 行有 {actual} 个元素, 应为 {expected} 个")]
    RaggedGrid {
        /// 出错的行 (从 0 开始, 不计空行).
        row: usize,
        /// 第一行的元素个数.
        expected: usize,
        /// 出错行的元素个数.
        actual: usize,
    },
}

/// 几何计算运行时结果.
pub type GeomResult<T> = Result<T, GeomError>;
