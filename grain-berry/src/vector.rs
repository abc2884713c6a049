//! 二维向量几何.
//!
//! 角度使用 **顺时针为正** 的约定: 若 `v1` 需要逆时针旋转才能到达 `v2`
//! (即叉积 `v1 x v2 > 0`), 返回负角度.
//!
//! 与之配套, [`rotate_points`] 以右乘旋转矩阵 `points . R` 的方式旋转点集,
//! 正角度对应顺时针旋转. 因此 `rotate_points(p, signed_angle_between_vectors(p, q))`
//! 会把 `p` 的方向转到 `q`.

use crate::error::{GeomError, GeomResult};
use crate::Vec2d;
use itertools::izip;
use ndarray::{arr2, Array2, ArrayView2};

#[inline]
fn dot((a, b): Vec2d, (c, d): Vec2d) -> f64 {
    a * c + b * d
}

#[inline]
fn cross((a, b): Vec2d, (c, d): Vec2d) -> f64 {
    a * d - b * c
}

/// 检查点数组是否为 `(n, 2)` 形状.
#[inline]
fn check_points(points: &ArrayView2<f64>) -> GeomResult<()> {
    match points.ncols() {
        2 => Ok(()),
        c => Err(GeomError::NotPointArray(c)),
    }
}

/// 将 `v1` 旋转到 `v2` 所需的弧度, 范围为 `(-PI, PI]`.
///
/// 两向量反向时, 无论顺序如何都返回 `PI`.
///
/// # 错误
///
/// 任一向量为零向量时返回 [`GeomError::ZeroVector`].
pub fn signed_angle_between_vectors(v1: Vec2d, v2: Vec2d) -> GeomResult<f64> {
    if v1 == (0.0, 0.0) || v2 == (0.0, 0.0) {
        return Err(GeomError::ZeroVector);
    }
    // `|v1| * |v2|` 写成 `sqrt(|v1|^2 * |v2|^2)`, 使 `v1 == v2` 时比值严格为 1.
    let norm_prod = (dot(v1, v1) * dot(v2, v2)).sqrt();
    let angle = num::clamp(dot(v1, v2) / norm_prod, -1.0, 1.0).acos();
    Ok(if cross(v1, v2) > 0.0 { -angle } else { angle })
}

/// 二维旋转矩阵 `[[cos, -sin], [sin, cos]]`.
#[inline]
fn rotation_matrix(angle: f64) -> Array2<f64> {
    let (sin, cos) = angle.sin_cos();
    arr2(&[[cos, -sin], [sin, cos]])
}

/// 旋转单个向量, 与 [`rotate_points`] 的约定一致.
#[inline]
fn rotate_vector((x, y): Vec2d, angle: f64) -> Vec2d {
    let (sin, cos) = angle.sin_cos();
    (x * cos + y * sin, y * cos - x * sin)
}

/// 绕原点旋转点集, 即 `points . [[cos, -sin], [sin, cos]]`.
///
/// `points` 必须是 `(n, 2)` 形状, 否则返回 [`GeomError::NotPointArray`].
pub fn rotate_points(points: ArrayView2<f64>, angle: f64) -> GeomResult<Array2<f64>> {
    check_points(&points)?;
    Ok(points.dot(&rotation_matrix(angle)))
}

/// 旋转点集, 使 `orientation` 方向与 `(1, 0)` 对齐.
///
/// 返回 `(旋转后的点集, 旋转后的方向向量, 逆旋转弧度)`. 以逆旋转弧度再调用一次
/// [`rotate_points`] 即可还原点集.
///
/// # 错误
///
/// - `orientation` 为零向量: [`GeomError::ZeroVector`];
/// - `points` 不是 `(n, 2)` 形状: [`GeomError::NotPointArray`].
pub fn align_points_to_vertical(
    points: ArrayView2<f64>,
    orientation: Vec2d,
) -> GeomResult<(Array2<f64>, Vec2d, f64)> {
    let angle = signed_angle_between_vectors(orientation, (1.0, 0.0))?;
    let rotated = rotate_points(points, angle)?;
    Ok((rotated, rotate_vector(orientation, angle), -angle))
}

/// 相邻点欧几里得距离之和. 少于两个点时为 `0.0`.
pub fn calculate_path_length(path: ArrayView2<f64>) -> GeomResult<f64> {
    check_points(&path)?;
    let (xs, ys) = (path.column(0), path.column(1));
    Ok(izip!(xs.iter(), xs.iter().skip(1), ys.iter(), ys.iter().skip(1))
        .map(|(x0, x1, y0, y1)| (x1 - x0).hypot(y1 - y0))
        .sum())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    fn f64_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    fn samples() -> Vec<Vec2d> {
        vec![
            (1.0, 0.0),
            (0.0, 1.0),
            (3.0, 4.0),
            (-2.0, 0.5),
            (-1.5, -7.25),
            (0.1, -0.3),
            (1e-3, 2e3),
        ]
    }

    #[test]
    fn test_concrete_angles() {
        let a = signed_angle_between_vectors((1.0, 0.0), (0.0, 1.0)).unwrap();
        assert!(f64_eq(a, -FRAC_PI_2));
        let a = signed_angle_between_vectors((0.0, 1.0), (1.0, 0.0)).unwrap();
        assert!(f64_eq(a, FRAC_PI_2));
        let a = signed_angle_between_vectors((1.0, 0.0), (1.0, 0.0)).unwrap();
        assert_eq!(a, 0.0);
        let a = signed_angle_between_vectors((1.0, 0.0), (1.0, -1.0)).unwrap();
        assert!(f64_eq(a, FRAC_PI_4));
        // 反向.
        let a = signed_angle_between_vectors((2.0, 0.0), (-1.0, 0.0)).unwrap();
        assert!(f64_eq(a, PI));
    }

    #[test]
    fn test_zero_vector() {
        assert_eq!(
            signed_angle_between_vectors((0.0, 0.0), (1.0, 2.0)),
            Err(GeomError::ZeroVector)
        );
        assert_eq!(
            signed_angle_between_vectors((1.0, 2.0), (0.0, 0.0)),
            Err(GeomError::ZeroVector)
        );
        assert_eq!(
            signed_angle_between_vectors((-0.0, 0.0), (-0.0, -0.0)),
            Err(GeomError::ZeroVector)
        );
    }

    #[test]
    fn test_self_angle_is_zero() {
        for v in samples() {
            assert_eq!(signed_angle_between_vectors(v, v).unwrap(), 0.0, "{v:?}");
        }
    }

    #[test]
    fn test_antisymmetry() {
        let vs = samples();
        for &v1 in vs.iter() {
            for &v2 in vs.iter() {
                // 反向向量两个方向都返回 PI, 不满足反对称.
                if cross(v1, v2) == 0.0 && dot(v1, v2) < 0.0 {
                    continue;
                }
                let a = signed_angle_between_vectors(v1, v2).unwrap();
                let b = signed_angle_between_vectors(v2, v1).unwrap();
                assert_eq!(a, -b, "{v1:?} {v2:?}");
                assert!(a > -PI && a <= PI);
            }
        }
    }

    #[test]
    fn test_rotation_round_trip() {
        let pts = Array2::from_shape_vec(
            (5, 2),
            vec![0.0, 0.0, 1.0, 2.0, -3.5, 0.25, 10.0, -4.0, 0.3, 0.7],
        )
        .unwrap();
        for &theta in [0.0, 0.3, -1.2, PI, 5.0].iter() {
            let there = rotate_points(pts.view(), theta).unwrap();
            let back = rotate_points(there.view(), -theta).unwrap();
            for (a, b) in back.iter().zip(pts.iter()) {
                assert!((a - b).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_rotate_matches_angle() {
        // 以两向量间的角度旋转 v1, 得到 v2 的方向.
        let (v1, v2) = ((3.0, 4.0), (-2.0, 0.5));
        let angle = signed_angle_between_vectors(v1, v2).unwrap();
        let p = rotate_points(arr2(&[[v1.0, v1.1]]).view(), angle).unwrap();
        let got = signed_angle_between_vectors((p[(0, 0)], p[(0, 1)]), v2).unwrap();
        assert!(got.abs() < 1e-7);
        let r = rotate_vector(v1, angle);
        assert!(f64_eq(r.0, p[(0, 0)]) && f64_eq(r.1, p[(0, 1)]));
    }

    #[test]
    fn test_rotate_bad_shape() {
        let pts = Array2::<f64>::zeros((3, 3));
        assert_eq!(
            rotate_points(pts.view(), 1.0).unwrap_err(),
            GeomError::NotPointArray(3)
        );
    }

    #[test]
    fn test_align() {
        let pts = arr2(&[[0.0, 0.0], [0.0, 2.0], [1.0, 3.0]]);
        let (aligned, orient, inverse) = align_points_to_vertical(pts.view(), (0.0, 1.0)).unwrap();
        assert!(f64_eq(orient.0, 1.0) && f64_eq(orient.1, 0.0));
        assert!(f64_eq(inverse, -FRAC_PI_2));
        assert!(f64_eq(aligned[(1, 0)], 2.0) && f64_eq(aligned[(1, 1)], 0.0));

        let restored = rotate_points(aligned.view(), inverse).unwrap();
        for (a, b) in restored.iter().zip(pts.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
        assert_eq!(
            align_points_to_vertical(pts.view(), (0.0, 0.0)).unwrap_err(),
            GeomError::ZeroVector
        );
    }

    #[test]
    fn test_path_length() {
        assert_eq!(calculate_path_length(arr2(&[[0.0, 0.0], [3.0, 4.0]]).view()), Ok(5.0));
        let path = arr2(&[[0.0, 0.0], [3.0, 4.0], [3.0, 5.0], [0.0, 1.0]]);
        assert!(f64_eq(calculate_path_length(path.view()).unwrap(), 11.0));
        assert_eq!(calculate_path_length(arr2(&[[1.0, 1.0]]).view()), Ok(0.0));
        assert_eq!(
            calculate_path_length(Array2::<f64>::zeros((0, 2)).view()),
            Ok(0.0)
        );
        assert_eq!(
            calculate_path_length(Array2::<f64>::zeros((2, 1)).view()),
            Err(GeomError::NotPointArray(1))
        );
    }
}
