pub mod stage0_normalize;
pub mod stage1_segment;
pub mod stage2_resolve;
pub mod stage3_assemble;
pub mod stage4_render;

pub use stage0_normalize::*;
pub use stage1_segment::*;
pub use stage2_resolve::*;
pub use stage3_assemble::*;
pub use stage4_render::*;
