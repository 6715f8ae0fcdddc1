// ============================================================================
// OPS: pixel algorithms operating on write sessions
// ============================================================================
//
//   fill.rs: stack-based scanline flood fill with an iteration cap
//   shapes.rs: line stepping, square stamps, round and square strokes
//   transform.rs: flip, scale and place captured sub-images
//   dashed.rs: dash patterns with a running phase
// ============================================================================

pub mod dashed;
pub mod fill;
pub mod shapes;
pub mod transform;
