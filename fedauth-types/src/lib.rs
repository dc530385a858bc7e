pub mod directory;
pub mod scope;
pub mod token;
pub mod wire;

pub use directory::*;
pub use scope::*;
pub use token::*;
pub use wire::*;
