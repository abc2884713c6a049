//! B 样条基函数与样条求值.

use crate::consts::MAX_SPLINE_ORDER;
use crate::error::{GeomError, GeomResult};
use ndarray::{Array1, ArrayView1};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 非零基函数缓冲区. `k` 阶样条在任一点至多有 `k + 1` 个非零基函数.
pub(crate) type Basis = [f64; MAX_SPLINE_ORDER + 1];

/// 找到 `l`, 使 `knots[l] <= x < knots[l + 1]`, 且 `k <= l < n - k - 1`.
///
/// 区间外的 `x` 落在首/末区间上, 即按端点处的多项式外推.
#[inline]
pub(crate) fn knot_interval(knots: &[f64], k: usize, x: f64) -> usize {
    let nk1 = knots.len() - k - 1;
    let cnt = knots[k..nk1].partition_point(|&v| v <= x);
    (k + cnt.saturating_sub(1)).min(nk1 - 1)
}

/// de Boor-Cox 递推: 计算 `x` 处 (位于第 `l` 个节点区间) 的 `k + 1` 个非零基函数值.
///
/// 返回值的第 `j` 项对应系数 `c[l - k + j]`.
pub(crate) fn bspline_basis(knots: &[f64], k: usize, x: f64, l: usize) -> Basis {
    let mut h: Basis = [0.0; MAX_SPLINE_ORDER + 1];
    let mut hh = [0.0; MAX_SPLINE_ORDER];
    h[0] = 1.0;
    for j in 1..=k {
        hh[..j].copy_from_slice(&h[..j]);
        h[0] = 0.0;
        for i in 1..=j {
            let li = l + i;
            let lj = li - j;
            if knots[li] == knots[lj] {
                h[i] = 0.0;
                continue;
            }
            let f = hh[i - 1] / (knots[li] - knots[lj]);
            h[i - 1] += f * (knots[li] - x);
            h[i] = f * (x - knots[lj]);
        }
    }
    h
}

/// 用节点 `knots`, 系数 `coefs` 表示的 `k` 阶样条在 `x` 处的值.
#[inline]
pub(crate) fn eval_with(knots: &[f64], coefs: &[f64], k: usize, x: f64) -> f64 {
    let l = knot_interval(knots, k, x);
    let h = bspline_basis(knots, k, x, l);
    coefs[l - k..=l]
        .iter()
        .zip(h.iter())
        .map(|(c, b)| c * b)
        .sum()
}

/// 一维 B 样条函数.
///
/// 节点序列两端各有 `k + 1` 个重节点, 系数个数为 `knots.len() - k - 1`.
/// 该对象只读, 求导会得到新的样条.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SplineModel {
    knots: Vec<f64>,
    coefs: Vec<f64>,
    order: usize,
}

impl SplineModel {
    /// 由节点, 系数和阶数直接构建样条. 上游保证三者长度匹配.
    #[inline]
    pub(crate) fn from_parts(knots: Vec<f64>, coefs: Vec<f64>, order: usize) -> Self {
        debug_assert_eq!(knots.len(), coefs.len() + order + 1);
        Self {
            knots,
            coefs,
            order,
        }
    }

    /// 节点序列 (含两端重节点).
    #[inline]
    pub fn knots(&self) -> &[f64] {
        &self.knots
    }

    /// 内部节点 (不含两端重节点).
    #[inline]
    pub fn interior_knots(&self) -> &[f64] {
        &self.knots[self.order + 1..self.knots.len() - self.order - 1]
    }

    /// B 样条系数.
    #[inline]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefs
    }

    /// 样条阶数 `k`.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// 求 `t` 处的值.
    #[inline]
    pub fn eval(&self, t: f64) -> f64 {
        eval_with(&self.knots, &self.coefs, self.order, t)
    }

    /// 逐点求值.
    pub fn eval_array(&self, t: ArrayView1<f64>) -> Array1<f64> {
        t.mapv(|v| self.eval(v))
    }

    /// 求 `nu` 阶导函数. `nu == 0` 时返回自身的拷贝.
    ///
    /// `nu` 超过样条阶数时返回 [`GeomError::DerivativeTooHigh`].
    pub fn derivative(&self, nu: usize) -> GeomResult<SplineModel> {
        if nu > self.order {
            return Err(GeomError::DerivativeTooHigh(nu, self.order));
        }
        let mut ans = self.clone();
        for _ in 0..nu {
            ans = ans.derivative_once();
        }
        Ok(ans)
    }

    /// 求 `t` 处的 `nu` 阶导数值.
    pub fn eval_derivative(&self, t: f64, nu: usize) -> GeomResult<f64> {
        Ok(self.derivative(nu)?.eval(t))
    }

    /// `c'_i = k (c_{i+1} - c_i) / (t_{i+k+1} - t_{i+1})`, 去掉首尾各一个节点.
    fn derivative_once(&self) -> SplineModel {
        let k = self.order;
        let coefs = self
            .coefs
            .windows(2)
            .enumerate()
            .map(|(i, c)| k as f64 * (c[1] - c[0]) / (self.knots[i + k + 1] - self.knots[i + 1]))
            .collect();
        let knots = self.knots[1..self.knots.len() - 1].to_vec();
        SplineModel::from_parts(knots, coefs, k - 1)
    }
}
