pub mod runtime;

pub use runtime::{
    ensure_major, ensure_minimum, probe_java, resolve_java_binary, JavaInstallation,
};
