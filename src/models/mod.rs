pub mod analysis;
pub mod audio;
pub mod transcript;

pub use analysis::*;
pub use audio::*;
pub use transcript::*;
