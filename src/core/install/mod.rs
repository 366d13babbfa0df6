pub mod installer;
pub mod plan;

pub use installer::{InstallReport, ProfileInstaller};
pub use plan::{client_item, library_items, logging_item};
