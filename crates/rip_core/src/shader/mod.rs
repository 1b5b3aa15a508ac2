//! Shader assembly listings dumped alongside captures.
//!
//! The listings are used to find out which of the captured vertex
//! attributes the GPU program actually consumed, and whether the pixel
//! program samples any texture at all.

mod scanner;

pub use scanner::*;
