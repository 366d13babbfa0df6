pub mod fabric;

pub use fabric::{FabricInstaller, FabricProfile};
