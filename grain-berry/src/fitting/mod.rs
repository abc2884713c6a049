//! 曲线拟合.
//!
//! 给定一列有序的点 `(x, y)`, 以点的序号 `t = 0, 1, ..., n-1` 为参数,
//! 分别拟合 `t -> x` 与 `t -> y` 两条加权平滑样条.

use crate::consts::fitpack::{MAX_ITER, TOLERANCE};
use crate::consts::{DEFAULT_SPLINE_ORDER, MAX_SPLINE_ORDER};
use crate::error::{GeomError, GeomResult};
use either::Either;
use ndarray::{Array1, ArrayView1};

mod bspline;
mod curfit;

pub use bspline::SplineModel;
pub use curfit::{FitStatus, SmoothingFit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 点误差. `Left` 为所有点共用的误差, `Right` 为逐点误差.
///
/// 点的权重为 `1 / sqrt(error)`: 误差越小, 样条越贴近该点.
pub type PointError<'a> = Either<f64, ArrayView1<'a, f64>>;

/// 平滑样条的拟合参数.
///
/// 该结构是只读的. 若要修改参数, 使用 `with_*` 方法得到新的实例.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplineSpec {
    order: usize,
    smoothing: Option<f64>,
    tolerance: f64,
    max_iter: u32,
}

impl Default for SplineSpec {
    #[inline]
    fn default() -> Self {
        Self::quartic()
    }
}

impl SplineSpec {
    /// 4 阶样条, 平滑因子 `s` 取点数 `m`.
    #[inline]
    pub const fn quartic() -> Self {
        Self {
            order: DEFAULT_SPLINE_ORDER,
            smoothing: None,
            tolerance: TOLERANCE,
            max_iter: MAX_ITER,
        }
    }

    /// 构建 `order` 阶样条的参数. 阶数必须在 `1..=5` 之内.
    pub fn with_order(order: usize) -> GeomResult<Self> {
        if !(1..=MAX_SPLINE_ORDER).contains(&order) {
            return Err(GeomError::InvalidOrder(order));
        }
        Ok(Self {
            order,
            ..Self::quartic()
        })
    }

    /// 指定平滑因子 `s`. `s == 0` 时得到插值样条.
    pub fn smoothing(self, s: f64) -> GeomResult<Self> {
        if !(s.is_finite() && s >= 0.0) {
            return Err(GeomError::InvalidSmoothing(s));
        }
        Ok(Self {
            smoothing: Some(s),
            ..self
        })
    }

    /// 指定收敛容差 (相对于 `s`) 与最大迭代次数. 非法值会被截断到合理范围.
    pub fn iteration(self, tolerance: f64, max_iter: u32) -> Self {
        let tolerance = if tolerance.is_finite() && tolerance > 0.0 {
            tolerance.min(1.0)
        } else {
            TOLERANCE
        };
        Self {
            tolerance,
            max_iter: max_iter.max(1),
            ..self
        }
    }

    /// 样条阶数.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// `m` 个点时实际使用的平滑因子.
    #[inline]
    pub fn smoothing_for(&self, m: usize) -> f64 {
        self.smoothing.unwrap_or(m as f64)
    }
}

/// 两条参数样条, 以及它们在每个原始 `t` 处的位置、一阶和二阶导数.
#[derive(Debug, Clone)]
pub struct SplinePair {
    /// `t -> x`.
    pub fx: SmoothingFit,
    /// `t -> y`.
    pub fy: SmoothingFit,
    /// 平滑后的 x.
    pub x: Array1<f64>,
    /// 平滑后的 y.
    pub y: Array1<f64>,
    /// `dx/dt`.
    pub dx: Array1<f64>,
    /// `dy/dt`.
    pub dy: Array1<f64>,
    /// `d2x/dt2`.
    pub d2x: Array1<f64>,
    /// `d2y/dt2`.
    pub d2y: Array1<f64>,
}

impl SplinePair {
    /// 点的个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// 是否为空. 拟合成功时总是非空.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// 检查点误差并换算为权重.
fn weights(error: &PointError, n: usize) -> GeomResult<Array1<f64>> {
    let check = |e: f64| {
        if e.is_finite() && e > 0.0 {
            Ok(1.0 / e.sqrt())
        } else {
            Err(GeomError::InvalidPointError(e))
        }
    };
    match error {
        Either::Left(e) => Ok(Array1::from_elem(n, check(*e)?)),
        Either::Right(errors) => {
            if errors.len() != n {
                return Err(GeomError::ShapeMismatch(n, errors.len()));
            }
            errors.iter().map(|&e| check(e)).collect()
        }
    }
}

/// 以 `t = 0..n-1` 为自变量, 对 `values` 拟合加权平滑样条.
///
/// 点数至少为 `spec.order() + 1`.
pub fn smoothing_spline(
    values: ArrayView1<f64>,
    error: PointError,
    spec: &SplineSpec,
) -> GeomResult<SmoothingFit> {
    let n = values.len();
    let w = weights(&error, n)?;
    fit_weighted(values, w.view(), spec)
}

fn fit_weighted(
    values: ArrayView1<f64>,
    w: ArrayView1<f64>,
    spec: &SplineSpec,
) -> GeomResult<SmoothingFit> {
    let n = values.len();
    if n <= spec.order {
        return Err(GeomError::TooFewPoints(n, spec.order + 1));
    }
    let t = Array1::from_iter((0..n).map(|i| i as f64));
    let imp = curfit::CurfitImp::new(
        t.view(),
        values.reborrow(),
        w.reborrow(),
        spec.order,
        spec.smoothing_for(n),
        (spec.tolerance, spec.max_iter),
    );
    Ok(imp.make_spline())
}

/// 拟合 `t -> x`, `t -> y` 两条样条, 并在每个原始 `t` 处求位置、一阶和二阶导数.
///
/// `x_points` 与 `y_points` 长度不同时返回 [`GeomError::ShapeMismatch`].
pub fn fit_spline_pair(
    x_points: ArrayView1<f64>,
    y_points: ArrayView1<f64>,
    error: PointError,
    spec: &SplineSpec,
) -> GeomResult<SplinePair> {
    let n = x_points.len();
    if n != y_points.len() {
        return Err(GeomError::ShapeMismatch(n, y_points.len()));
    }
    let w = weights(&error, n)?;
    let fx = fit_weighted(x_points, w.view(), spec)?;
    let fy = fit_weighted(y_points, w.view(), spec)?;

    let t = Array1::from_iter((0..n).map(|i| i as f64));
    let (dfx, d2fx) = (fx.model().derivative(1)?, fx.model().derivative(2)?);
    let (dfy, d2fy) = (fy.model().derivative(1)?, fy.model().derivative(2)?);

    Ok(SplinePair {
        x: fx.model().eval_array(t.view()),
        y: fy.model().eval_array(t.view()),
        dx: dfx.eval_array(t.view()),
        dy: dfy.eval_array(t.view()),
        d2x: d2fx.eval_array(t.view()),
        d2y: d2fy.eval_array(t.view()),
        fx,
        fy,
    })
}
