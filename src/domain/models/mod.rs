mod entity;
mod filter;
mod item;

pub use entity::*;
pub use filter::*;
pub use item::*;
