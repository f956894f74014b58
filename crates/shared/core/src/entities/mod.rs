mod asset;
mod path;

pub use asset::Asset;
pub use path::Path;
