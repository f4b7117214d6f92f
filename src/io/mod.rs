pub mod input;
pub mod legislators;
pub mod output;

pub use input::*;
pub use legislators::*;
pub use output::*;
