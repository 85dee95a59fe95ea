pub mod path;
pub mod resolver;

pub use path::NotePath;
pub use resolver::{find_any_path, resolve_run_path};
