mod section;
mod story;
pub mod toc;

pub use section::*;
pub use story::*;
