//! Detail noise for chunk surfaces.
//!
//! Plain multi-octave value noise over a per-chunk random basis; the basis is
//! drawn from the chunk's own RNG stream so chunks can be synthesized in any
//! order.

mod value;

pub use value::{apply_detail, seed_basis, synthesize, synthesize_from_basis, DetailNoiseConfig};
