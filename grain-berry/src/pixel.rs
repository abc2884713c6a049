//! 连续路径的像素化.
//!
//! 将亚像素精度的路径 (例如样条输出) 转换为单像素宽、无冗余的像素链.

use crate::error::{GeomError, GeomResult};
use crate::neighbour::is_n8_touching;
use crate::Idx2d;
use ndarray::{Array2, ArrayView2, Axis};
use ordered_float::OrderedFloat;

/// 截断 (向零取整) 为像素索引. 非有限值或截断后为负时返回 `None`.
#[inline]
fn truncate(v: f64) -> Option<usize> {
    match v.trunc() {
        t if t.is_finite() && t >= 0.0 => Some(t as usize),
        _ => None,
    }
}

/// 检查 `(n, 2)` 形状, 并把每一行截断为像素索引, 同时去掉相邻的重复像素.
fn collapse_duplicates(path: ArrayView2<f64>) -> GeomResult<Vec<Idx2d>> {
    let mut ans: Vec<Idx2d> = Vec::with_capacity(path.nrows());
    for (i, row) in path.axis_iter(Axis(0)).enumerate() {
        let pos = match (truncate(row[0]), truncate(row[1])) {
            (Some(h), Some(w)) => (h, w),
            _ => return Err(GeomError::InvalidCoordinate(i)),
        };
        if ans.last() != Some(&pos) {
            ans.push(pos);
        }
    }
    Ok(ans)
}

/// 将连续路径转换为像素图与像素路径.
///
/// `path` 的每一行是一个点, 其两个坐标截断后分别作为行、列索引.
///
/// 1. 截断后相邻的重复像素只保留一个;
/// 2. 若某个中间像素的下一个像素与上一个 **保留下来的** 像素 8-相接,
///    则该像素是多余的 "桥", 被跳过;
/// 3. 首尾像素总是保留. 注意它们不仅被画进像素图, 也出现在返回的像素路径中,
///    调用者无需自行补上首尾.
///
/// 像素图为正方形, 边长为 `floor(max + 1)`, `max` 是截断前所有坐标的最大值.
/// 空路径返回 `1 x 1` 的全零图和空路径.
///
/// # 错误
///
/// - `path` 不是 `(n, 2)` 形状: [`GeomError::NotPointArray`];
/// - 某个坐标不是有限值或截断后为负: [`GeomError::InvalidCoordinate`].
pub fn spline_path_to_pixel_map(path: ArrayView2<f64>) -> GeomResult<(Array2<u8>, Vec<Idx2d>)> {
    if path.ncols() != 2 {
        return Err(GeomError::NotPointArray(path.ncols()));
    }
    let pixels = collapse_duplicates(path)?;
    if pixels.is_empty() {
        return Ok((Array2::zeros((1, 1)), vec![]));
    }

    // 坐标均已检查过. `(-1, 0)` 内的坐标截断为 0, 边长至少要容纳所有像素.
    let extent = pixels.iter().map(|&(h, w)| h.max(w) + 1).max().unwrap_or(1);
    let side = path
        .iter()
        .copied()
        .map(OrderedFloat)
        .max()
        .map_or(1, |OrderedFloat(v)| (v + 1.0) as usize)
        .max(extent);
    let mut grid = Array2::<u8>::zeros((side, side));

    let last = pixels.len() - 1;
    let mut trace = Vec::with_capacity(pixels.len());
    trace.push(pixels[0]);
    for (i, &pos) in pixels.iter().enumerate().skip(1) {
        let prev = trace[trace.len() - 1];
        if i != last && is_n8_touching(pixels[i + 1], prev) {
            continue;
        }
        trace.push(pos);
    }

    for &pos in trace.iter() {
        grid[pos] = 1;
    }
    log::trace!(
        "像素化: {} 个点 -> {} 个像素 (去重后 {} 个)",
        path.nrows(),
        trace.len(),
        pixels.len()
    );
    Ok((grid, trace))
}
