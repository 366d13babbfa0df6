// ─── Genecraft Core ───
// Install, verify and launch pipeline for a single pinned game version.
//
// Architecture:
//   core/
//     version/    manifest client, version descriptor, platform rules
//     downloader/ content-addressed fetcher with hash verification
//     assets/     asset index + object layout
//     maven/      coordinate to library path
//     java/       runtime probing and version checks
//     loaders/    Fabric installer subprocess + its profile manifest
//     install/    install orchestration with progress
//     launch/     placeholders, command-line builder, process spawn
//     profile/    installed profile discovery, verify, launch
//     auth/       Microsoft → Xbox Live → XSTS → game login chain
//     state/      per-session wiring

pub mod assets;
pub mod auth;
pub mod cancel;
pub mod config;
pub mod downloader;
pub mod error;
pub mod events;
pub mod http;
pub mod install;
pub mod java;
pub mod launch;
pub mod loaders;
pub mod maven;
pub mod paths;
pub mod profile;
pub mod state;
pub mod system;
pub mod version;
