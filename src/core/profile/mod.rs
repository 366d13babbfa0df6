pub mod manager;
pub mod model;

pub use manager::ProfileManager;
pub use model::{ClientSettings, InstalledProfile};
