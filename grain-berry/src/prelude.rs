//! 🍇欢迎光临🍓
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::{GeomError, GeomResult, Idx2d, Vec2d};

pub use crate::consts::{DEFAULT_PERIODS, DEFAULT_POINT_ERROR, DEFAULT_SPLINE_ORDER};

pub use crate::fitting::{
    fit_spline_pair, smoothing_spline, FitStatus, PointError, SmoothingFit, SplineModel,
    SplinePair, SplineSpec,
};

pub use crate::curvature::{
    curvature_from_points, curvature_from_spline, curvature_periodic_boundary, CurvatureProfile,
};

#[cfg(feature = "rayon")]
pub use crate::curvature::par_curvature_periodic_boundary;

pub use crate::pixel::spline_path_to_pixel_map;

pub use crate::vector::{
    align_points_to_vertical, calculate_path_length, rotate_points, signed_angle_between_vectors,
};

pub use either::Either;
