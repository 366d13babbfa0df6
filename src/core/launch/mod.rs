pub mod classpath;
pub mod command;
pub mod placeholders;
pub mod task;

pub use classpath::build_classpath;
pub use command::{heap_size_mb, CommandLine, CommandLineBuilder, RuntimeOptions, MOD_LOADER_MARKER};
pub use placeholders::{ArgumentQuoting, LaunchPlaceholders, PlaceholderKey};
pub use task::run_java;
