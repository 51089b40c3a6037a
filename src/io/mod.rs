pub mod output;
pub mod workspace;

pub use output::*;
pub use workspace::*;
