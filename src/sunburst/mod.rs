//! Pure geometry: sunburst layout, colouring and hit-testing.
//!
//! Nothing in here knows where usage numbers come from.

pub mod color;
pub mod hit;
pub mod layout;
pub mod node;
