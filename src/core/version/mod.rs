pub mod manifest;
pub mod rules;
pub mod version_file;

pub use manifest::{Manifest, ManifestClient, VersionRef};
pub use rules::{complies, is_active, HostPlatform, OsConstraint, Rule, RuleAction};
pub use version_file::{
    ArgumentEntry, ArgumentValue, Arguments, AssetIndexRef, DownloadArtifact, LibraryEntry,
    LoggingClient, VersionDescriptor,
};
