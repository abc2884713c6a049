//! 像素邻域相关的辅助函数.

use crate::Idx2d;

/// 获得 `(h, w)` 的 4-邻居索引. 不检查越界.
///
/// 越过上/左边界的索引会回绕成很大的值, 调用者只需检查 `< 高/宽` 即可.
#[inline]
pub(crate) fn neighbour4((h, w): Idx2d) -> [Idx2d; 4] {
    [
        (h.wrapping_sub(1), w),
        (h.saturating_add(1), w),
        (h, w.wrapping_sub(1)),
        (h, w.saturating_add(1)),
    ]
}

/// 两个像素是否 8-相接 (切比雪夫距离不超过 1).
///
/// 注意同一个像素也视为相接.
#[inline]
pub fn is_n8_touching((a, b): Idx2d, (c, d): Idx2d) -> bool {
    a.abs_diff(c) <= 1 && b.abs_diff(d) <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching() {
        assert!(is_n8_touching((3, 3), (3, 3)));
        assert!(is_n8_touching((3, 3), (2, 4)));
        assert!(is_n8_touching((0, 0), (1, 1)));
        assert!(!is_n8_touching((0, 0), (0, 2)));
        assert!(!is_n8_touching((5, 1), (3, 1)));
    }

    #[test]
    fn test_neighbours_are_touching() {
        let center = (4, 7);
        for p in neighbour4(center) {
            assert!(is_n8_touching(center, p));
            assert_ne!(center, p);
        }
    }

    #[test]
    fn test_neighbour4_corner() {
        // 越界索引回绕, 不会与合法索引混淆.
        let n4 = neighbour4((0, 0));
        assert_eq!(n4[0], (usize::MAX, 0));
        assert_eq!(n4[2], (0, usize::MAX));
        assert_eq!(n4[1], (1, 0));
        assert_eq!(n4[3], (0, 1));
    }
}
