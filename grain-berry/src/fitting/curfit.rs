//! 加权平滑样条 (FITPACK `curfit` 算法).
//!
//! 给定数据点 `(x_i, y_i)` 与权重 `w_i`, 在满足
//! `fp = sum((w_i * (y_i - s(x_i)))^2) <= s` 的样条中, 求 `k` 阶导数在各内部节点处
//! 跳跃量平方和最小的那一条. 节点个数由算法自行决定.
//!
//! 观测矩阵是带状的, 全程使用 Givens 旋转做 QR 三角化, 不需要 LAPACK.

// ref: P. Dierckx, "Curve and Surface Fitting with Splines", 1993. 第 5 章.

use super::bspline::{bspline_basis, eval_with, knot_interval, SplineModel};
use crate::consts::fitpack::{CON1, CON4, CON9};
use crate::consts::MAX_SPLINE_ORDER;
use itertools::izip;
use ndarray::{s, Array1, Array2, ArrayView1, ArrayView2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拟合结束时的状态.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FitStatus {
    /// 最小二乘多项式 (无内部节点) 已经满足 `fp <= s`.
    Polynomial,

    /// 当前节点上的最小二乘样条恰好满足 `|fp - s| < tol * s`.
    LeastSquares,

    /// 找到了满足 `|fp - s| < tol * s` 的平滑样条.
    Smoothing,

    /// 插值样条 (`s == 0`).
    Interpolating,

    /// 平滑参数迭代达到上限, 结果精度可能不足.
    MaxIterations,

    /// 平滑参数迭代没有按理论单调收敛, 结果精度可能不足.
    Diverged,

    /// 已无可插入新节点的区间, 返回当前最小二乘样条.
    KnotsExhausted,
}

/// 平滑样条拟合结果.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmoothingFit {
    pub(crate) model: SplineModel,
    pub(crate) residual: f64,
    pub(crate) status: FitStatus,
}

impl SmoothingFit {
    /// 拟合得到的样条.
    #[inline]
    pub fn model(&self) -> &SplineModel {
        &self.model
    }

    /// 取出样条.
    #[inline]
    pub fn into_model(self) -> SplineModel {
        self.model
    }

    /// 加权残差平方和 `fp`.
    #[inline]
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// 拟合状态.
    #[inline]
    pub fn status(&self) -> FitStatus {
        self.status
    }
}

/// 三角化后的带状观测矩阵 `a` (每行从对角元开始存储) 与右端项 `z`.
struct Triangle {
    a: Array2<f64>,
    z: Array1<f64>,
}

/// 计算 Givens 旋转参数. `ww` 是三角矩阵上的对角元, 会被原地更新.
#[inline]
fn givens(piv: f64, ww: &mut f64) -> (f64, f64) {
    let dd = piv.hypot(*ww);
    let cos = *ww / dd;
    let sin = piv / dd;
    *ww = dd;
    (cos, sin)
}

/// 对 `(a, b)` 施加旋转. `a` 属于待消去的行, `b` 属于三角矩阵.
#[inline]
fn rotate(cos: f64, sin: f64, a: &mut f64, b: &mut f64) {
    let (s1, s2) = (*a, *b);
    *b = cos * s2 + sin * s1;
    *a = cos * s1 - sin * s2;
}

/// 带宽为 `width` 的上三角带状方程组回代.
fn back_substitute(a: ArrayView2<f64>, z: ArrayView1<f64>, width: usize) -> Vec<f64> {
    let n = z.len();
    let mut c = vec![0.0; n];
    for i in (0..n).rev() {
        let mut store = z[i];
        for l in 1..width.min(n - i) {
            store -= c[i + l] * a[(i, l)];
        }
        c[i] = store / a[(i, 0)];
    }
    c
}

/// 两端各 `k + 1` 个重节点, 中间为 `interior`.
fn clamped_knots(xb: f64, xe: f64, k: usize, interior: &[f64]) -> Vec<f64> {
    let mut knots = Vec::with_capacity(2 * (k + 1) + interior.len());
    knots.extend(std::iter::repeat(xb).take(k + 1));
    knots.extend_from_slice(interior);
    knots.extend(std::iter::repeat(xe).take(k + 1));
    knots
}

/// 插值样条的节点: 奇数阶取数据点, 偶数阶取相邻数据点的中点.
fn interpolation_knots(x: ArrayView1<f64>, k: usize) -> Vec<f64> {
    let m = x.len();
    let k3 = k / 2;
    let interior: Vec<f64> = (0..m - k - 1)
        .map(|l| {
            if k % 2 == 1 {
                x[k3 + 1 + l]
            } else {
                (x[k3 + 1 + l] + x[k3 + l]) * 0.5
            }
        })
        .collect();
    clamped_knots(x[0], x[m - 1], k, &interior)
}

/// 各内部节点处 `k` 阶导数的跳跃量. 第 `r` 行作用于系数 `r..r + k + 2`.
///
/// 按节点区间平均长度做了归一化, 以免不同尺度的 `x` 影响 `p` 的量级.
fn discontinuity(knots: &[f64], k: usize) -> Array2<f64> {
    let k1 = k + 1;
    let k2 = k + 2;
    let nk1 = knots.len() - k1;
    let nrint = nk1 - k;
    let fac = nrint as f64 / (knots[nk1] - knots[k]);

    let mut b = Array2::<f64>::zeros((nk1 - k1, k2));
    let mut h = [0.0; 2 * (MAX_SPLINE_ORDER + 1)];
    for l in k1..nk1 {
        let r = l - k1;
        for j in 0..k1 {
            h[j] = knots[l] - knots[l + j - k1];
            h[j + k1] = knots[l] - knots[l + j + 1];
        }
        for j in 0..k2 {
            let prod = h[j + 1..=j + k]
                .iter()
                .fold(h[j], |acc, &v| acc * v * fac);
            b[(r, j)] = (knots[r + j + k1] - knots[r + j]) / prod;
        }
    }
    b
}

/// 记录 `p` 的求根区间: `f1 > 0 > f3`, `p3 < 0` 表示无穷大.
struct Bracket {
    p1: f64,
    f1: f64,
    p3: f64,
    f3: f64,
}

impl Bracket {
    /// 由 `(p1, f1)`, `(p2, f2)`, `(p3, f3)` 三点做有理插值得到新的 `p`,
    /// 同时用 `(p2, f2)` 收缩区间.
    fn rational(&mut self, p2: f64, f2: f64) -> f64 {
        let Self { p1, f1, p3, f3 } = *self;
        let p = if p3 > 0.0 {
            let h1 = f1 * (f2 - f3);
            let h2 = f2 * (f3 - f1);
            let h3 = f3 * (f1 - f2);
            -(p1 * p2 * h3 + p2 * p3 * h1 + p3 * p1 * h2) / (p1 * h1 + p2 * h2 + p3 * h3)
        } else {
            (p1 * (f1 - f3) * f2 - p2 * (f2 - f3) * f1) / ((f1 - f2) * f3)
        };
        if f2 < 0.0 {
            self.p3 = p2;
            self.f3 = f2;
        } else {
            self.p1 = p2;
            self.f1 = f2;
        }
        p
    }
}

/// 平滑样条拟合的实现. `x` 严格递增.
pub(crate) struct CurfitImp<'a> {
    x: ArrayView1<'a, f64>,
    y: ArrayView1<'a, f64>,
    w: ArrayView1<'a, f64>,
    k: usize,
    s: f64,
    tol: f64,
    max_iter: u32,
}

impl<'a> CurfitImp<'a> {
    /// 上游已完成参数检查: 长度一致, `m > k`, 权重为有限正数, `s >= 0`.
    #[inline]
    pub fn new(
        x: ArrayView1<'a, f64>,
        y: ArrayView1<'a, f64>,
        w: ArrayView1<'a, f64>,
        k: usize,
        s: f64,
        (tol, max_iter): (f64, u32),
    ) -> Self {
        debug_assert_eq!(x.len(), y.len());
        debug_assert_eq!(x.len(), w.len());
        debug_assert!(x.len() > k);
        Self {
            x,
            y,
            w,
            k,
            s,
            tol,
            max_iter,
        }
    }

    pub fn make_spline(&self) -> SmoothingFit {
        let k = self.k;
        let m = self.x.len();
        let nmin = 2 * (k + 1);
        let nmax = m + k + 1;

        if self.s == 0.0 {
            let knots = interpolation_knots(self.x, k);
            let (_, coefs) = self.least_squares(&knots);
            return self.finish(knots, coefs, FitStatus::Interpolating);
        }

        let acc = self.tol * self.s;
        let mut knots = clamped_knots(self.x[0], self.x[m - 1], k, &[]);
        // 每个节点区间内部 (不含端点) 的数据点个数.
        let mut nrdata = vec![m.saturating_sub(2)];
        let mut fp0 = 0.0;
        let mut fpold = 0.0;
        let mut nplus = 0usize;

        loop {
            let n = knots.len();
            let (tri, coefs) = self.least_squares(&knots);
            let (fp, mut fpint) = self.residuals(&knots, &coefs);
            log::debug!("curfit: {} 个节点, fp = {fp:.6e}, s = {}", n, self.s);

            if n == nmin {
                fp0 = fp;
            }
            let fpms = fp - self.s;
            if fpms.abs() < acc {
                let status = if n == nmin {
                    FitStatus::Polynomial
                } else {
                    FitStatus::LeastSquares
                };
                return self.finish(knots, coefs, status);
            }
            if fpms < 0.0 {
                if n == nmin {
                    return self.finish(knots, coefs, FitStatus::Polynomial);
                }
                return self.smooth(knots, &tri, fp0, fpms);
            }
            // 插值样条的 fp 只剩舍入误差, 仅在 `s` 极小时走到这里.
            if n >= nmax {
                return self.finish(knots, coefs, FitStatus::Interpolating);
            }

            nplus = if n == nmin {
                1
            } else {
                let mut npl1 = nplus * 2;
                if fpold - fp > acc {
                    npl1 = (nplus as f64 * fpms / (fpold - fp)) as usize;
                }
                (nplus * 2).min(npl1.max(nplus / 2).max(1))
            };
            fpold = fp;

            let mut inserted = false;
            for _ in 0..nplus {
                if !insert_knot(self.x, &mut knots, &mut fpint, &mut nrdata, k) {
                    break;
                }
                inserted = true;
                if knots.len() == nmax {
                    knots = interpolation_knots(self.x, k);
                    break;
                }
            }
            if !inserted {
                log::warn!("curfit: 无法继续插入节点, 返回最小二乘样条 (fp = {fp:.6e})");
                return self.finish(knots, coefs, FitStatus::KnotsExhausted);
            }
        }
    }

    /// 在给定节点上求加权最小二乘样条. 返回三角化的观测矩阵与系数.
    fn least_squares(&self, knots: &[f64]) -> (Triangle, Vec<f64>) {
        let k = self.k;
        let k1 = k + 1;
        let nk1 = knots.len() - k1;
        let mut a = Array2::<f64>::zeros((nk1, k1));
        let mut z = Array1::<f64>::zeros(nk1);

        for (&xi, &yi, &wi) in izip!(self.x, self.y, self.w) {
            let l = knot_interval(knots, k, xi);
            let mut h = bspline_basis(knots, k, xi, l);
            h[..k1].iter_mut().for_each(|v| *v *= wi);
            let mut yi = yi * wi;

            // 将这一行旋转进三角矩阵.
            for i in 0..k1 {
                let piv = h[i];
                if piv == 0.0 {
                    continue;
                }
                let j = l - k + i;
                let (cos, sin) = givens(piv, &mut a[(j, 0)]);
                rotate(cos, sin, &mut yi, &mut z[j]);
                for i1 in i + 1..k1 {
                    rotate(cos, sin, &mut h[i1], &mut a[(j, i1 - i)]);
                }
            }
        }

        let coefs = back_substitute(a.view(), z.view(), k1);
        (Triangle { a, z }, coefs)
    }

    /// 加权残差平方和, 以及每个节点区间上的残差和.
    ///
    /// 恰好落在内部节点上的点, 其残差平分给两侧的区间.
    fn residuals(&self, knots: &[f64], coefs: &[f64]) -> (f64, Vec<f64>) {
        let k = self.k;
        let nk1 = knots.len() - k - 1;
        let nrint = nk1 - k;
        let mut fpint = vec![0.0; nrint];
        let mut fp = 0.0;
        let mut fpart = 0.0;
        let mut i = 0;
        let mut l = k + 1;

        for (&xi, &yi, &wi) in izip!(self.x, self.y, self.w) {
            let new = l < nk1 && xi >= knots[l];
            if new {
                l += 1;
            }
            let term = (wi * (yi - eval_with(knots, coefs, k, xi))).powi(2);
            fp += term;
            fpart += term;
            if new {
                let store = term * 0.5;
                fpint[i] = fpart - store;
                i += 1;
                fpart = store;
            }
        }
        fpint[nrint - 1] = fpart;
        (fp, fpint)
    }

    /// 固定节点, 寻找平滑参数 `p` 使 `fp(p) = s`.
    ///
    /// `fp0` 是最小二乘多项式的残差 (对应 `p = 0`), `fpms` 是当前节点上最小二乘样条
    /// 的 `fp - s` (对应 `p = inf`, 必然 < 0).
    fn smooth(&self, knots: Vec<f64>, tri: &Triangle, fp0: f64, fpms: f64) -> SmoothingFit {
        let acc = self.tol * self.s;
        let disc = discontinuity(&knots, self.k);
        let nk1 = tri.z.len();

        let mut p = nk1 as f64 / tri.a.column(0).sum();
        let mut bracket = Bracket {
            p1: 0.0,
            f1: fp0 - self.s,
            p3: -1.0,
            f3: fpms,
        };
        let (mut ich1, mut ich3) = (false, false);

        for iter in 1..=self.max_iter {
            let coefs = self.penalized(disc.view(), tri, p);
            let (fp, _) = self.residuals(&knots, &coefs);
            let f2 = fp - self.s;
            log::trace!("curfit: 第 {iter} 次迭代, p = {p:.6e}, fp = {fp:.6e}");

            if f2.abs() < acc {
                return self.finish_with(knots, coefs, fp, FitStatus::Smoothing);
            }
            if iter == self.max_iter {
                log::warn!("curfit: 平滑参数迭代达到上限 {iter}, |fp - s| = {:.6e}", f2.abs());
                return self.finish_with(knots, coefs, fp, FitStatus::MaxIterations);
            }

            let p2 = p;
            if !ich3 {
                if f2 - bracket.f3 <= acc {
                    // 初始 p 太大.
                    bracket.p3 = p2;
                    bracket.f3 = f2;
                    p *= CON4;
                    if p <= bracket.p1 {
                        p = bracket.p1 * CON9 + p2 * CON1;
                    }
                    continue;
                }
                if f2 < 0.0 {
                    ich3 = true;
                }
            }
            if !ich1 {
                if bracket.f1 - f2 <= acc {
                    // 初始 p 太小.
                    bracket.p1 = p2;
                    bracket.f1 = f2;
                    p /= CON4;
                    if bracket.p3 >= 0.0 && p >= bracket.p3 {
                        p = p2 * CON1 + bracket.p3 * CON9;
                    }
                    continue;
                }
                if f2 > 0.0 {
                    ich1 = true;
                }
            }
            if f2 >= bracket.f1 || f2 <= bracket.f3 {
                log::warn!("curfit: 平滑参数迭代未能单调收敛, p = {p:.6e}");
                return self.finish_with(knots, coefs, fp, FitStatus::Diverged);
            }
            p = bracket.rational(p2, f2);
        }
        unreachable!("max_iter >= 1")
    }

    /// 把乘以 `1/p` 的跳跃量行旋转进最小二乘三角矩阵, 回代得到系数.
    fn penalized(&self, disc: ArrayView2<f64>, tri: &Triangle, p: f64) -> Vec<f64> {
        let k1 = self.k + 1;
        let k2 = self.k + 2;
        let nk1 = tri.z.len();
        let pinv = 1.0 / p;

        let mut g = Array2::<f64>::zeros((nk1, k2));
        g.slice_mut(s![.., ..k1]).assign(&tri.a);
        let mut c = tri.z.clone();

        let mut h = [0.0; MAX_SPLINE_ORDER + 2];
        for (it, row) in disc.rows().into_iter().enumerate() {
            h[..k2]
                .iter_mut()
                .zip(row.iter())
                .for_each(|(hv, &b)| *hv = b * pinv);
            let mut yi = 0.0;
            for j in it..nk1 {
                if h[..k2].iter().all(|&v| v == 0.0) {
                    break;
                }
                let piv = h[0];
                let i2 = if j + k1 >= nk1 { nk1 - j - 1 } else { k1 };
                if piv != 0.0 {
                    let (cos, sin) = givens(piv, &mut g[(j, 0)]);
                    rotate(cos, sin, &mut yi, &mut c[j]);
                    for i in 0..i2 {
                        rotate(cos, sin, &mut h[i + 1], &mut g[(j, i + 1)]);
                    }
                }
                if j == nk1 - 1 {
                    break;
                }
                for i in 0..i2 {
                    h[i] = h[i + 1];
                }
                h[i2] = 0.0;
            }
        }

        back_substitute(g.view(), c.view(), k2)
    }

    fn finish(&self, knots: Vec<f64>, coefs: Vec<f64>, status: FitStatus) -> SmoothingFit {
        let (fp, _) = self.residuals(&knots, &coefs);
        self.finish_with(knots, coefs, fp, status)
    }

    #[inline]
    fn finish_with(
        &self,
        knots: Vec<f64>,
        coefs: Vec<f64>,
        residual: f64,
        status: FitStatus,
    ) -> SmoothingFit {
        SmoothingFit {
            model: SplineModel::from_parts(knots, coefs, self.k),
            residual,
            status,
        }
    }
}

/// 在残差和最大且内部仍有数据点的区间中点处插入一个新节点.
///
/// 节点总是落在数据点上. 新区间的残差按数据点个数比例分配, 因此可以连续插入多个节点
/// 而不必重新拟合. 没有可插入的区间时返回 `false`.
fn insert_knot(
    x: ArrayView1<f64>,
    knots: &mut Vec<f64>,
    fpint: &mut Vec<f64>,
    nrdata: &mut Vec<usize>,
    k: usize,
) -> bool {
    let mut fpmax = 0.0;
    let mut pick = None;
    let mut jbegin = 0;
    for (j, (&fp, &jpoint)) in fpint.iter().zip(nrdata.iter()).enumerate() {
        if fp > fpmax && jpoint != 0 {
            fpmax = fp;
            pick = Some((j, jpoint, jbegin));
        }
        jbegin += jpoint + 1;
    }
    let Some((number, maxpt, maxbeg)) = pick else {
        return false;
    };

    let ihalf = maxpt / 2 + 1;
    knots.insert(k + number + 1, x[maxbeg + ihalf]);

    let am = maxpt as f64;
    nrdata[number] = ihalf - 1;
    nrdata.insert(number + 1, maxpt - ihalf);
    fpint[number] = fpmax * (ihalf - 1) as f64 / am;
    fpint.insert(number + 1, fpmax * (maxpt - ihalf) as f64 / am);
    true
}
