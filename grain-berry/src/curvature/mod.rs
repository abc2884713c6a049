//! 基于平滑样条的有向曲率计算.
//!
//! 曲率由参数曲线公式给出:
//!
//! ```text
//! k = (dx * d2y - dy * d2x) / (dx^2 + dy^2)^(3/2)
//! ```
//!
//! 逆时针转向时曲率为正. 驻点处 (`dx = dy = 0`) 分母为 0, 结果按 IEEE 浮点语义
//! 为 `NaN` 或 `inf`, 本模块不做任何处理, 由调用者自行过滤.

mod periodic;

pub use periodic::curvature_periodic_boundary;

#[cfg(feature = "rayon")]
pub use periodic::par_curvature_periodic_boundary;

use crate::error::GeomResult;
use crate::fitting::{fit_spline_pair, PointError, SplinePair, SplineSpec};
use ndarray::{Array1, ArrayView1, Zip};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 曲率以及平滑后的曲线, 与输入点逐一对应.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CurvatureProfile {
    pub(crate) curvature: Array1<f64>,
    pub(crate) spline_x: Array1<f64>,
    pub(crate) spline_y: Array1<f64>,
}

impl CurvatureProfile {
    /// 点的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.curvature.len()
    }

    /// 是否为空. 计算成功时总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.curvature.is_empty()
    }

    /// 每个点处的有向曲率.
    #[inline]
    pub fn curvature(&self) -> ArrayView1<'_, f64> {
        self.curvature.view()
    }

    /// 平滑后的 x 坐标.
    #[inline]
    pub fn spline_x(&self) -> ArrayView1<'_, f64> {
        self.spline_x.view()
    }

    /// 平滑后的 y 坐标.
    #[inline]
    pub fn spline_y(&self) -> ArrayView1<'_, f64> {
        self.spline_y.view()
    }

    /// 拆分为 `(curvature, spline_x, spline_y)`.
    #[inline]
    pub fn into_parts(self) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
        (self.curvature, self.spline_x, self.spline_y)
    }

    /// 非有限值 (`NaN`, `inf`) 的个数.
    pub fn non_finite_count(&self) -> usize {
        self.curvature.iter().filter(|v| !v.is_finite()).count()
    }
}

/// 由样条导数计算曲率.
pub fn curvature_from_spline(pair: SplinePair) -> CurvatureProfile {
    let curvature = Zip::from(&pair.dx)
        .and(&pair.dy)
        .and(&pair.d2x)
        .and(&pair.d2y)
        .map_collect(|&dx, &dy, &d2x, &d2y| {
            (dx * d2y - dy * d2x) / (dx * dx + dy * dy).powf(1.5)
        });
    let profile = CurvatureProfile {
        curvature,
        spline_x: pair.x,
        spline_y: pair.y,
    };
    let bad = profile.non_finite_count();
    if bad > 0 {
        log::debug!("曲率中有 {bad} 个非有限值 (曲线存在驻点)");
    }
    profile
}

/// 计算一列点的曲率.
///
/// 以点序号为参数分别拟合 `t -> x`, `t -> y` 两条平滑样条, 再由其一阶、二阶导数求曲率.
/// 返回的平滑坐标可以直接用于作图.
///
/// `x_points` 与 `y_points` 长度不同时返回 [`GeomError::ShapeMismatch`](crate::GeomError::ShapeMismatch).
pub fn curvature_from_points(
    x_points: ArrayView1<f64>,
    y_points: ArrayView1<f64>,
    error: PointError,
    spec: &SplineSpec,
) -> GeomResult<CurvatureProfile> {
    let pair = fit_spline_pair(x_points, y_points, error, spec)?;
    Ok(curvature_from_spline(pair))
}
