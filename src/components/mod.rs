// ============================================================================
// COMPONENTS: editor-level state driven by pointer input
// ============================================================================
//
//   colors.rs: RGBA color with tolerance comparison and flattening
//   tools.rs: thickness ranges, instruments and the toolbox
//   selection.rs: floating selection with lift, move, resize/flip and marquee
// ============================================================================

pub mod colors;
pub mod selection;
pub mod tools;
