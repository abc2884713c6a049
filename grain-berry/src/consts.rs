//! 通用常量.

/// 默认的点误差. 点权重为 `1 / sqrt(error)`.
pub const DEFAULT_POINT_ERROR: f64 = 0.1;

/// 默认的样条阶数.
///
/// 4 阶样条的二阶导数仍然连续, 这是计算曲率的前提.
pub const DEFAULT_SPLINE_ORDER: usize = 4;

/// 周期边界曲率计算时, 默认在原始点两侧各重复的次数.
pub const DEFAULT_PERIODS: usize = 2;

/// 支持的最高样条阶数.
pub const MAX_SPLINE_ORDER: usize = 5;

/// 平滑样条相关的数值常量.
pub mod fitpack {
    /// 相对容差. `|fp - s| < TOLERANCE * s` 时认为已收敛.
    pub const TOLERANCE: f64 = 0.001;

    /// 寻找平滑参数 `p` 的最大迭代次数.
    pub const MAX_ITER: u32 = 20;

    /// `p` 的区间收缩系数.
    pub(crate) const CON1: f64 = 0.1;

    /// `p` 的区间收缩系数.
    pub(crate) const CON9: f64 = 0.9;

    /// `p` 过大或过小时的缩放系数.
    pub(crate) const CON4: f64 = 0.04;
}
