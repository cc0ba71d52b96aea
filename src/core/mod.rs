pub mod models;

pub use models::{ChildRegistry, ChildRole, Configuration, ExecCommand};
