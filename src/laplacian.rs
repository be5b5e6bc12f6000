//! Weighted Laplacian estimation for the fourth-order diffusion scheme.
//!
//! At every grid cell the estimator evaluates first, second and cross
//! second differences of the current estimate over a reflected 3-point
//! neighborhood, splits the local curvature into a component along the
//! gradient direction and a component orthogonal to it, and blends the two
//! with an edge-stopping coefficient. The result is an edge-aware Laplacian
//! field that the explicit update step diffuses in a second pass.
//!
//! Grids are flat row-major slices with x the fastest-varying axis, then y,
//! then z. Cells carry no cross-cell write dependency, so both kernels fan
//! out over rayon with one writer per row (2D) or per z-plane (3D).

use rayon::prelude::*;

use crate::boundary::reflect_pair;
use crate::float_trait::DiffusionFloat;

// =============================================================================
// Constants
// =============================================================================

/// Floor substituted for the squared gradient magnitude when normalizing
/// the curvature components. Prevents division blow-up on flat regions.
pub(crate) const DENOM_EPSILON: f64 = 1.0e-7;

/// Minimum rows per rayon work unit for 2D kernels.
pub(crate) const RAYON_MIN_ROWS: usize = 16;

/// Minimum z-planes per rayon work unit for 3D kernels.
pub(crate) const RAYON_MIN_PLANES: usize = 2;

// =============================================================================
// 2D Estimator
// =============================================================================

/// Compute the edge-weighted Laplacian field of `u` into `w_lapl` (2D).
///
/// `sigma_sq` is the squared edge-preservation scale. Both slices hold
/// `dim_x * dim_y` samples, x fastest.
pub fn weighted_laplacian_2d<F: DiffusionFloat>(
    w_lapl: &mut [F],
    u: &[F],
    sigma_sq: F,
    dim_x: usize,
    dim_y: usize,
) {
    debug_assert_eq!(u.len(), dim_x * dim_y);
    debug_assert_eq!(w_lapl.len(), dim_x * dim_y);

    let half = F::from_f64_c(0.5);
    let quarter = F::from_f64_c(0.25);
    let two = F::from_f64_c(2.0);
    let eps = F::from_f64_c(DENOM_EPSILON);

    w_lapl
        .par_chunks_mut(dim_x)
        .with_min_len(RAYON_MIN_ROWS)
        .enumerate()
        .for_each(|(j, out_row)| {
            let (j_prev, j_next) = reflect_pair(j, dim_y);
            let row = j * dim_x;
            let row_prev = j_prev * dim_x;
            let row_next = j_next * dim_x;

            for i in 0..dim_x {
                let (i_prev, i_next) = reflect_pair(i, dim_x);
                let center = u[row + i];

                // Half-step central first differences
                let grad_x = half * (u[row + i_prev] - u[row + i_next]);
                let grad_y = half * (u[row_prev + i] - u[row_next + i]);
                let grad_x_sq = grad_x * grad_x;
                let grad_y_sq = grad_y * grad_y;

                // Pure and cross second differences
                let grad_xx = u[row + i_prev] + u[row + i_next] - two * center;
                let grad_yy = u[row_prev + i] + u[row_next + i] - two * center;
                let grad_xy = quarter
                    * (u[row_prev + i_prev] + u[row_next + i_next]
                        - u[row_next + i_prev]
                        - u[row_prev + i_next]);
                let xy_2 = two * grad_x * grad_y * grad_xy;

                // Squared gradient magnitude, floored for flat regions
                let denom = grad_x_sq + grad_y_sq;
                let norm = if denom <= eps { eps } else { denom };

                // Curvature along the gradient and orthogonal to it
                let v_norm = (grad_xx * grad_x_sq + xy_2 + grad_yy * grad_y_sq) / norm;
                let v_orth = (grad_xx * grad_y_sq - xy_2 + grad_yy * grad_x_sq) / norm;

                // Edge-stopping coefficient: near 1 on flat regions,
                // decaying toward 0 at strong gradients.
                let c = F::one() / (F::one() + denom / sigma_sq);

                out_row[i] = c * c * v_norm + c * v_orth;
            }
        });
}

// =============================================================================
// 3D Estimator
// =============================================================================

/// Compute the edge-weighted Laplacian field of `u` into `w_lapl` (3D).
///
/// Extends the 2D estimator with a third axis and the three cross terms of
/// every axis pair. Both slices hold `dim_x * dim_y * dim_z` samples.
pub fn weighted_laplacian_3d<F: DiffusionFloat>(
    w_lapl: &mut [F],
    u: &[F],
    sigma_sq: F,
    dim_x: usize,
    dim_y: usize,
    dim_z: usize,
) {
    let plane = dim_x * dim_y;
    debug_assert_eq!(u.len(), plane * dim_z);
    debug_assert_eq!(w_lapl.len(), plane * dim_z);

    let half = F::from_f64_c(0.5);
    let quarter = F::from_f64_c(0.25);
    let two = F::from_f64_c(2.0);
    let eps = F::from_f64_c(DENOM_EPSILON);

    w_lapl
        .par_chunks_mut(plane)
        .with_min_len(RAYON_MIN_PLANES)
        .enumerate()
        .for_each(|(k, out_plane)| {
            let (k_prev, k_next) = reflect_pair(k, dim_z);
            let base = k * plane;
            let base_prev = k_prev * plane;
            let base_next = k_next * plane;

            for j in 0..dim_y {
                let (j_prev, j_next) = reflect_pair(j, dim_y);
                let row = j * dim_x;
                let row_prev = j_prev * dim_x;
                let row_next = j_next * dim_x;

                for i in 0..dim_x {
                    let (i_prev, i_next) = reflect_pair(i, dim_x);
                    let center = u[base + row + i];

                    let grad_x = half * (u[base + row + i_prev] - u[base + row + i_next]);
                    let grad_y = half * (u[base + row_prev + i] - u[base + row_next + i]);
                    let grad_z = half * (u[base_prev + row + i] - u[base_next + row + i]);
                    let grad_x_sq = grad_x * grad_x;
                    let grad_y_sq = grad_y * grad_y;
                    let grad_z_sq = grad_z * grad_z;

                    let grad_xx = u[base + row + i_prev] + u[base + row + i_next] - two * center;
                    let grad_yy = u[base + row_prev + i] + u[base + row_next + i] - two * center;
                    let grad_zz = u[base_prev + row + i] + u[base_next + row + i] - two * center;

                    let grad_xy = quarter
                        * (u[base + row_prev + i_prev] + u[base + row_next + i_next]
                            - u[base + row_next + i_prev]
                            - u[base + row_prev + i_next]);
                    let grad_xz = quarter
                        * (u[base_prev + row + i_prev] - u[base_prev + row + i_next]
                            - u[base_next + row + i_prev]
                            + u[base_next + row + i_next]);
                    let grad_yz = quarter
                        * (u[base_prev + row_prev + i] - u[base_prev + row_next + i]
                            - u[base_next + row_prev + i]
                            + u[base_next + row_next + i]);

                    let xy_2 = two * grad_x * grad_y * grad_xy;
                    let xz_2 = two * grad_x * grad_z * grad_xz;
                    let yz_2 = two * grad_y * grad_z * grad_yz;

                    let denom = grad_x_sq + grad_y_sq + grad_z_sq;
                    let norm = if denom <= eps { eps } else { denom };

                    let v_norm = (grad_xx * grad_x_sq
                        + grad_yy * grad_y_sq
                        + grad_zz * grad_z_sq
                        + xy_2
                        + xz_2
                        + yz_2)
                        / norm;
                    let v_orth = ((grad_y_sq + grad_z_sq) * grad_xx
                        + (grad_x_sq + grad_z_sq) * grad_yy
                        + (grad_x_sq + grad_y_sq) * grad_zz
                        - xy_2
                        - xz_2
                        - yz_2)
                        / norm;

                    let c = F::one() / (F::one() + denom / sigma_sq);

                    out_plane[row + i] = c * c * v_norm + c * v_orth;
                }
            }
        });
}

// =============================================================================
// Tests
// =============================================================================
