pub mod congress_legislators;
pub mod document;
pub mod identity;
pub mod line;
pub mod turn;

pub use congress_legislators::*;
pub use document::*;
pub use identity::*;
pub use line::*;
pub use turn::*;
