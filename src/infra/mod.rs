//! Hardware-facing layer: collaborator traits and the memory-mapped register
//! backend used on target.
pub mod mmio;
pub mod traits;
