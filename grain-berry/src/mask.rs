//! 标签图像与掩膜的辅助函数.

use crate::error::{GeomError, GeomResult};
use crate::neighbour::neighbour4;
use ndarray::{Array2, ArrayView1, ArrayView2};

/// 对于以 0 为背景, 1 和 2 分别为两个物体的标签图像, 找出物体 1 中与物体 2
/// 4-相邻的像素.
///
/// 对角方向不算相邻. 结果只包含物体 1 一侧的像素, 图像边界外视为背景.
pub fn touching_pixels<T>(image: ArrayView2<T>) -> Array2<bool>
where
    T: num::Integer + Copy,
{
    let one = T::one();
    let two = one + one;
    let (height, width) = image.dim();
    Array2::from_shape_fn((height, width), |pos| {
        image[pos] == one
            && neighbour4(pos)
                .into_iter()
                .any(|(h, w)| h < height && w < width && image[(h, w)] == two)
    })
}

/// 两个掩膜是否有重叠, 即是否存在两者都不为背景的像素.
///
/// 默认值 (数值为 0, `bool` 为 `false`) 视为背景.
/// 形状不同时返回 [`GeomError::GridShapeMismatch`].
pub fn detect_overlap<T>(mask_1: ArrayView2<T>, mask_2: ArrayView2<T>) -> GeomResult<bool>
where
    T: Default + PartialEq,
{
    if mask_1.dim() != mask_2.dim() {
        return Err(GeomError::GridShapeMismatch(mask_1.dim(), mask_2.dim()));
    }
    let bg = T::default();
    Ok(mask_1
        .iter()
        .zip(mask_2.iter())
        .any(|(a, b)| *a != bg && *b != bg))
}

/// `array` 的某一行是否与 `coordinate` 完全相等.
pub fn coordinate_in_array<T: PartialEq>(coordinate: ArrayView1<T>, array: ArrayView2<T>) -> bool {
    array.rows().into_iter().any(|row| row == coordinate)
}

/// 从文本构建二维整数网格, 便于在测试中手写图像和掩膜.
///
/// 每行是以空白分隔的整数; 空行 (包括只含空白的行) 被忽略, 行首尾空白被去掉.
///
/// ```
/// use grain_berry::mask::grid_from_str;
///
/// let grid = grid_from_str(
///     "
///     0 1 0
///     1 1 1
///     ",
/// )
/// .unwrap();
/// assert_eq!(grid.dim(), (2, 3));
/// assert_eq!(grid[(1, 2)], 1);
/// ```
///
/// # 错误
///
/// - 出现非整数内容: [`GeomError::BadGridToken`];
/// - 各行长度不一致: [`GeomError::RaggedGrid`].
pub fn grid_from_str(text: &str) -> GeomResult<Array2<i64>> {
    let rows = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            line.split_whitespace()
                .map(|tok| {
                    tok.parse::<i64>()
                        .map_err(|_| GeomError::BadGridToken(tok.to_string()))
                })
                .collect::<GeomResult<Vec<_>>>()
        })
        .collect::<GeomResult<Vec<_>>>()?;

    let expected = rows.first().map_or(0, Vec::len);
    if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
        return Err(GeomError::RaggedGrid {
            row,
            expected,
            actual: r.len(),
        });
    }
    Ok(Array2::from_shape_fn((rows.len(), expected), |(h, w)| {
        rows[h][w]
    }))
}
