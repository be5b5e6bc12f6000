//! Symmetric (reflective) boundary index resolution.
//!
//! Out-of-domain neighbor accesses mirror one step back into the domain
//! rather than wrapping or clamping. Every stencil kernel resolves its
//! neighborhood through this module so that the estimator and the update
//! step read identical neighborhoods.

/// Resolve the reflected `(previous, next)` neighbor indices for position
/// `p` on an axis of length `dim`.
///
/// `p + 1` reflects to `p - 1` at the upper edge and `p - 1` reflects to
/// `p + 1` at the lower edge. A singleton axis (`dim == 1`) degenerates to
/// both neighbors pointing at `p` itself, which zeroes all differences
/// along that axis.
///
/// Requires `dim >= 1` and `p < dim`.
#[inline(always)]
pub fn reflect_pair(p: usize, dim: usize) -> (usize, usize) {
    let next = if p + 1 >= dim { p.saturating_sub(1) } else { p + 1 };
    let prev = if p == 0 { 1.min(dim - 1) } else { p - 1 };
    (prev, next)
}
