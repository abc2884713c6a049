//! 闭合曲线的周期边界曲率.
//!
//! 样条在序列两端拟合较差. 对于首尾相连的曲线, 将点序列原样首尾拼接多次,
//! 在延长后的序列上计算曲率, 再只取远离两端的一段, 从而避开端点误差.

use super::{curvature_from_points, CurvatureProfile};
use crate::error::{GeomError, GeomResult};
use crate::fitting::{PointError, SplineSpec};
use either::Either;
use ndarray::{concatenate, s, Array1, ArrayView1, Axis};

/// 将 `arr` 原样拼接 `times` 次.
fn tile(arr: ArrayView1<f64>, times: usize) -> Array1<f64> {
    let views = vec![arr; times];
    // 所有视图形状相同, 拼接不会失败; 仅 `times == 0` 时为空.
    concatenate(Axis(0), &views).unwrap_or_else(|_| Array1::zeros(0))
}

/// 取出延长序列中返回给调用者的那一段 `[n * (periods / 2), n * (periods / 2 + 1))`.
///
/// 注意 `periods` 为奇数时该窗口并不在延长序列正中间. 例如 `periods = 1` 时,
/// 延长序列为原序列的 3 倍, 取出的却是第一段.
#[inline]
fn window(n: usize, periods: usize) -> (usize, usize) {
    let half = periods / 2;
    (n * half, n * (half + 1))
}

/// 计算首尾相连的一列点的曲率.
///
/// 原序列会被原样拼接为 `2 * periods + 1` 段 (不做镜像), 在此之上调用
/// [`curvature_from_points`], 最后取出长度恰为原点数的一段 (见 [`window`]).
/// 逐点误差会按与点相同的方式拼接.
///
/// `x_points` 与 `y_points` 长度不同, 或逐点误差的个数与点数不同时,
/// 返回 [`GeomError::ShapeMismatch`] (报告的是拼接前的长度).
pub fn curvature_periodic_boundary(
    x_points: ArrayView1<f64>,
    y_points: ArrayView1<f64>,
    error: PointError,
    periods: usize,
    spec: &SplineSpec,
) -> GeomResult<CurvatureProfile> {
    let n = x_points.len();
    if n != y_points.len() {
        return Err(GeomError::ShapeMismatch(n, y_points.len()));
    }
    if let Either::Right(e) = &error {
        if e.len() != n {
            return Err(GeomError::ShapeMismatch(n, e.len()));
        }
    }
    let times = 2 * periods + 1;
    let ext_x = tile(x_points, times);
    let ext_y = tile(y_points, times);
    let ext_err = error.map_right(|e| tile(e, times));
    let ext_err = match &ext_err {
        Either::Left(e) => Either::Left(*e),
        Either::Right(e) => Either::Right(e.view()),
    };

    let ext = curvature_from_points(ext_x.view(), ext_y.view(), ext_err, spec)?;
    let (lo, hi) = window(n, periods);
    log::debug!(
        "周期边界曲率: {n} 个点延长为 {} 个, 取 [{lo}, {hi})",
        ext.len()
    );
    let (curvature, spline_x, spline_y) = ext.into_parts();
    Ok(CurvatureProfile {
        curvature: curvature.slice(s![lo..hi]).to_owned(),
        spline_x: spline_x.slice(s![lo..hi]).to_owned(),
        spline_y: spline_y.slice(s![lo..hi]).to_owned(),
    })
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 借助 `rayon`, 并行地计算多条闭合曲线的周期边界曲率.
///
/// 各曲线之间互不影响, 返回结果与 `loops` 一一对应.
#[cfg(feature = "rayon")]
pub fn par_curvature_periodic_boundary(
    loops: &[(ArrayView1<f64>, ArrayView1<f64>)],
    error: f64,
    periods: usize,
    spec: &SplineSpec,
) -> Vec<GeomResult<CurvatureProfile>> {
    loops
        .par_iter()
        .map(|(x, y)| curvature_periodic_boundary(*x, *y, Either::Left(error), periods, spec))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{DEFAULT_PERIODS, DEFAULT_POINT_ERROR};
    use crate::consts::fitpack::TOLERANCE;
    use crate::curvature::tests::{circle, init_logger};
    use crate::fitting::{fit_spline_pair, FitStatus};
    use ndarray::arr1;

    #[test]
    fn test_window() {
        assert_eq!(window(10, 0), (0, 10));
        assert_eq!(window(10, 1), (0, 10));
        assert_eq!(window(10, 2), (10, 20));
        assert_eq!(window(10, 3), (10, 20));
        assert_eq!(window(10, 4), (20, 30));
    }

    #[test]
    fn test_tile() {
        let a = arr1(&[1.0, 2.0, 3.0]);
        assert_eq!(tile(a.view(), 3), arr1(&[1.0, 2.0, 3.0, 1.0, 2.0, 3.0, 1.0, 2.0, 3.0]));
        assert_eq!(tile(a.view(), 1), a);
    }

    #[test]
    fn test_shape_mismatch() {
        let x = arr1(&[0.0, 1.0, 2.0]);
        let y = arr1(&[0.0, 1.0]);
        let err = curvature_periodic_boundary(
            x.view(),
            y.view(),
            Either::Left(DEFAULT_POINT_ERROR),
            DEFAULT_PERIODS,
            &SplineSpec::default(),
        );
        assert_eq!(err.unwrap_err(), GeomError::ShapeMismatch(3, 2));

        // 逐点误差长度不对时, 报告调用者传入的长度而不是延长后的长度.
        let (x, y) = circle(2.0, 12);
        let errors = Array1::from_elem(7, DEFAULT_POINT_ERROR);
        let err = curvature_periodic_boundary(
            x.view(),
            y.view(),
            Either::Right(errors.view()),
            DEFAULT_PERIODS,
            &SplineSpec::default(),
        );
        assert_eq!(err.unwrap_err(), GeomError::ShapeMismatch(12, 7));
    }

    #[test]
    fn test_window_length_is_input_length() {
        let (x, y) = circle(5.0, 24);
        for periods in 0..=4 {
            let p = curvature_periodic_boundary(
                x.view(),
                y.view(),
                Either::Left(DEFAULT_POINT_ERROR),
                periods,
                &SplineSpec::default(),
            )
            .unwrap();
            assert_eq!(p.len(), 24);
            assert_eq!(p.spline_x().len(), 24);
            assert_eq!(p.spline_y().len(), 24);
        }
    }

    /// 奇数 `periods` 时窗口偏离中心, 这里固定现有行为.
    #[test]
    fn test_odd_periods_take_first_copy() {
        let (x, y) = circle(5.0, 16);
        let spec = SplineSpec::default();
        let err = Either::Left(DEFAULT_POINT_ERROR);
        let p = curvature_periodic_boundary(x.view(), y.view(), err, 1, &spec).unwrap();

        let ext_x = tile(x.view(), 3);
        let ext_y = tile(y.view(), 3);
        let full = curvature_from_points(ext_x.view(), ext_y.view(), err, &spec).unwrap();
        assert_eq!(p.curvature(), full.curvature().slice(s![0..16]));
        assert_eq!(p.spline_x(), full.spline_x().slice(s![0..16]));
        assert_eq!(p.spline_y(), full.spline_y().slice(s![0..16]));
    }

    #[test]
    fn test_unit_circle() {
        init_logger();
        let (x, y) = circle(1.0, 100);
        let p = curvature_periodic_boundary(
            x.view(),
            y.view(),
            Either::Left(1e-6),
            DEFAULT_PERIODS,
            &SplineSpec::default(),
        )
        .unwrap();
        assert_eq!(p.len(), 100);
        for k in p.curvature().iter() {
            assert!((k - 1.0).abs() < 0.1, "curvature {k}");
        }
    }

    #[test]
    fn test_unit_circle_default_error() {
        let (x, y) = circle(1.0, 100);
        let spec = SplineSpec::default();
        let err = Either::Left(DEFAULT_POINT_ERROR);
        let p = curvature_periodic_boundary(x.view(), y.view(), err, DEFAULT_PERIODS, &spec)
            .unwrap();
        for k in p.curvature().iter() {
            assert!((k - 1.0).abs() < 0.05, "curvature {k}");
        }

        // 延长序列上的两条样条都收敛.
        let times = 2 * DEFAULT_PERIODS + 1;
        let (ext_x, ext_y) = (tile(x.view(), times), tile(y.view(), times));
        let pair = fit_spline_pair(ext_x.view(), ext_y.view(), err, &spec).unwrap();
        let s = spec.smoothing_for(ext_x.len());
        for fit in [&pair.fx, &pair.fy] {
            assert_eq!(fit.status(), FitStatus::Smoothing);
            assert!((fit.residual() - s).abs() < TOLERANCE * s);
        }
    }

    #[test]
    fn test_per_point_error_is_tiled() {
        let (x, y) = circle(3.0, 20);
        let errors = Array1::from_elem(20, DEFAULT_POINT_ERROR);
        let spec = SplineSpec::default();
        let a = curvature_periodic_boundary(
            x.view(),
            y.view(),
            Either::Right(errors.view()),
            2,
            &spec,
        )
        .unwrap();
        let b = curvature_periodic_boundary(
            x.view(),
            y.view(),
            Either::Left(DEFAULT_POINT_ERROR),
            2,
            &spec,
        )
        .unwrap();
        assert_eq!(a, b);
    }

    #[cfg(feature = "rayon")]
    #[test]
    fn test_par_matches_serial() {
        let loops: Vec<_> = [3.0, 5.0, 8.0].iter().map(|&r| circle(r, 30)).collect();
        let views: Vec<_> = loops.iter().map(|(x, y)| (x.view(), y.view())).collect();
        let spec = SplineSpec::default();
        let par = par_curvature_periodic_boundary(&views, DEFAULT_POINT_ERROR, 2, &spec);
        for ((x, y), got) in views.iter().zip(par) {
            let want = curvature_periodic_boundary(
                *x,
                *y,
                Either::Left(DEFAULT_POINT_ERROR),
                2,
                &spec,
            );
            assert_eq!(got, want);
        }
    }
}
