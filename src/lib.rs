pub use lynx_core::*;
pub use lynx_macros::Entity;
