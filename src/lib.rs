//! Fourth-Order Anisotropic Diffusion Core Library
//!
//! Pure Rust implementation of the explicit fourth-order anisotropic
//! diffusion scheme (Hajiaboli 2011) for edge-preserving denoising of 2D
//! images and 3D volumes. This crate contains the numerical engine only:
//! the stencil kernels and the iteration driver. I/O, multi-channel
//! dispatch and parameter sweeps are left to the caller.

pub mod boundary;
pub mod float_trait;
pub mod laplacian;
pub mod pipeline;
pub mod update;

// Re-export commonly used items at the crate root
pub use boundary::reflect_pair;
pub use float_trait::DiffusionFloat;
pub use laplacian::{weighted_laplacian_2d, weighted_laplacian_3d};
pub use pipeline::{denoise_2d, denoise_3d, DiffusionConfig, DiffusionDiagnostics};
pub use update::{diffusion_update_2d, diffusion_update_3d};
