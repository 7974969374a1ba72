mod host;
mod page;

pub use host::*;
pub use page::*;
