pub mod stage0_normalize;
pub mod stage1_transcribe;
pub mod stage2_analyze;

pub use stage0_normalize::*;
pub use stage1_transcribe::*;
pub use stage2_analyze::*;
