#![warn(missing_docs)] // <= 合适时移除它.

//! 核心库. 提供显微图像中晶界 (或其它轮廓) 的几何计算: 加权平滑样条拟合、有向曲率、
//! 连续路径像素化以及二维向量旋转.
//!
//! 所有计算都是无状态的纯函数. 同一输入在不同线程中调用得到完全相同的结果,
//! 因此对大量互不相关的轮廓可以放心并行处理.
//!
//! # 注意
//!
//! 1. 数值退化 (例如曲线驻点处曲率公式的分母为 0) **不是** 错误,
//!   结果按 IEEE 浮点语义为 `NaN` / `inf`, 由调用者自行过滤.
//! 2. 其余非法输入 (长度不一致、零向量等) 通过 [`GeomError`] 返回, 不会 panic.
//!
//! # 开发计划
//!
//! ### 加权平滑样条的纯 Rust 实现 ✅
//!
//! 以点序号为参数分别拟合 `t -> x`, `t -> y`. 节点选取和平滑参数的迭代与
//! FITPACK `curfit` 一致, 不依赖 LAPACK.
//!
//! 实现位于 `grain-berry/src/fitting`.
//!
//! ### 有向曲率 ✅
//!
//! 1. 开放曲线的曲率; ✅
//! 2. 闭合曲线的周期边界曲率 (首尾拼接, 只取中间一段); ✅
//! 3. 借助 `rayon` 并行计算多条闭合曲线. ✅
//!
//! 实现位于 `grain-berry/src/curvature`.
//!
//! ### 连续路径像素化 ✅
//!
//! 去重, 去掉多余的 "桥" 像素, 保留首尾.
//!
//! 实现位于 `grain-berry/src/pixel.rs`.
//!
//! ### 向量角度与旋转 ✅
//!
//! 实现位于 `grain-berry/src/vector.rs`.
//!
//! ### 小功能 ✅
//!
//! 1. 两物体相接像素; ✅
//! 2. 掩膜重叠检测; ✅
//! 3. 从文本构建网格 (便于测试). ✅
//!
//! 实现位于 `grain-berry/src/mask.rs`.

/// 二维像素索引 `(行, 列)`.
pub type Idx2d = (usize, usize);

/// 二维浮点向量 / 点.
pub type Vec2d = (f64, f64);

pub mod consts;

mod error;

pub use error::{GeomError, GeomResult};

pub mod fitting;

pub mod curvature;

pub mod pixel;

pub mod vector;

pub mod mask;

pub mod neighbour;

pub mod prelude;
