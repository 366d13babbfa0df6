// ─── Command Line Builder ───
// Expands a version's argument templates into concrete JVM and game argv.
// Pure: no network, no filesystem.

use std::path::{Path, PathBuf};

use super::classpath::build_classpath;
use super::placeholders::{ArgumentQuoting, LaunchPlaceholders, PlaceholderKey};
use crate::core::version::{is_active, ArgumentEntry, HostPlatform, VersionDescriptor};

/// JVM property the Fabric runtime shim expects.
pub const MOD_LOADER_MARKER: &str = "-DFabricMcEmu=net.minecraft.client.main.Main";

/// JVM templates for descriptors that only carry `minecraftArguments`.
const LEGACY_JVM_TEMPLATES: [&str; 3] = [
    "-Djava.library.path=${natives_directory}",
    "-cp",
    "${classpath}",
];

const MIN_HEAP_MB: u64 = 2048;
const HEAP_ALIGN_MB: u64 = 1024;

#[derive(Debug, Clone, Default)]
pub struct RuntimeOptions {
    /// 0 leaves the heap size to the JVM.
    pub max_memory_mb: u32,
    pub width: u32,
    pub height: u32,
    /// Append the mod-loader marker property.
    pub mod_loader: bool,
    pub quoting: ArgumentQuoting,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    pub jvm_args: Vec<String>,
    pub game_args: Vec<String>,
}

impl CommandLine {
    /// `<jvm args...> <main class> <game args...>`
    pub fn argv(&self, main_class: &str) -> Vec<String> {
        let mut argv = Vec::with_capacity(self.jvm_args.len() + self.game_args.len() + 1);
        argv.extend(self.jvm_args.iter().cloned());
        argv.push(main_class.to_string());
        argv.extend(self.game_args.iter().cloned());
        argv
    }
}

/// Max heap in MB: below 2048 becomes 2048, otherwise rounded up to a
/// multiple of 1024. `None` for 0.
pub fn heap_size_mb(requested_mb: u32) -> Option<u64> {
    let requested = u64::from(requested_mb);
    match requested {
        0 => None,
        r if r < MIN_HEAP_MB => Some(MIN_HEAP_MB),
        r => Some(r.div_ceil(HEAP_ALIGN_MB) * HEAP_ALIGN_MB),
    }
}

pub struct CommandLineBuilder<'a> {
    version: &'a VersionDescriptor,
    host: &'a HostPlatform,
    libraries_dir: &'a Path,
    game_jar: &'a Path,
}

impl<'a> CommandLineBuilder<'a> {
    pub fn new(
        version: &'a VersionDescriptor,
        host: &'a HostPlatform,
        libraries_dir: &'a Path,
        game_jar: &'a Path,
    ) -> Self {
        Self {
            version,
            host,
            libraries_dir,
            game_jar,
        }
    }

    pub fn build(
        &self,
        placeholders: &LaunchPlaceholders,
        classpath_extras: &[PathBuf],
        extra_jvm_args: &[String],
        options: &RuntimeOptions,
    ) -> CommandLine {
        let classpath = build_classpath(
            self.version,
            self.host,
            self.libraries_dir,
            classpath_extras,
            self.game_jar,
        );
        let placeholders = placeholders
            .clone()
            .with(PlaceholderKey::Classpath, classpath)
            .with(
                PlaceholderKey::ClasspathSeparator,
                self.host.classpath_separator(),
            );
        let quoting = options.quoting;

        let mut jvm_args = Vec::new();
        self.expand_entries(&self.version.arguments.jvm, &placeholders, quoting, &mut jvm_args);
        if self.version.arguments.jvm.is_empty() && self.version.minecraft_arguments.is_some() {
            for template in LEGACY_JVM_TEMPLATES {
                push_expanded(&mut jvm_args, template, &placeholders, quoting);
            }
        }
        for arg in extra_jvm_args {
            push_expanded(&mut jvm_args, arg, &placeholders, quoting);
        }
        if options.mod_loader {
            jvm_args.push(MOD_LOADER_MARKER.to_string());
        }
        if let Some(heap) = heap_size_mb(options.max_memory_mb) {
            jvm_args.push(format!("-Xmx{}M", heap));
        }
        if let Some(logging) = self.version.logging_client() {
            push_expanded(&mut jvm_args, &logging.argument, &placeholders, quoting);
        }

        let mut game_args = Vec::new();
        self.expand_entries(&self.version.arguments.game, &placeholders, quoting, &mut game_args);
        self.expand_entries(
            &self.version.legacy_game_arguments(),
            &placeholders,
            quoting,
            &mut game_args,
        );
        if options.width > 0 && options.height > 0 {
            game_args.extend([
                "--width".to_string(),
                options.width.to_string(),
                "--height".to_string(),
                options.height.to_string(),
            ]);
        }

        CommandLine {
            jvm_args,
            game_args,
        }
    }

    fn expand_entries(
        &self,
        entries: &[ArgumentEntry],
        placeholders: &LaunchPlaceholders,
        quoting: ArgumentQuoting,
        out: &mut Vec<String>,
    ) {
        for entry in entries {
            match entry {
                ArgumentEntry::Literal(template) => {
                    push_expanded(out, template, placeholders, quoting);
                }
                ArgumentEntry::Conditional { rules, value } => {
                    if is_active(rules, self.host) {
                        for template in value.as_slice() {
                            push_expanded(out, template, placeholders, quoting);
                        }
                    }
                }
            }
        }
    }
}

fn push_expanded(
    out: &mut Vec<String>,
    template: &str,
    placeholders: &LaunchPlaceholders,
    quoting: ArgumentQuoting,
) {
    match placeholders.expand(template, quoting) {
        Some(arg) if !arg.is_empty() => out.push(arg),
        _ => {
            // `--xuid ${auth_xuid}`: the flag goes with its value.
            if is_standalone_placeholder(template) {
                drop_dangling_option(out);
            }
        }
    }
}

fn is_standalone_placeholder(template: &str) -> bool {
    template.starts_with("${") && template.ends_with('}') && template.matches("${").count() == 1
}

fn drop_dangling_option(args: &mut Vec<String>) {
    if args
        .last()
        .is_some_and(|last| last.starts_with("--") || last == "-cp" || last == "-classpath")
    {
        let _ = args.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JAR: &str = "/root/versions/p/p.jar";

    fn linux() -> HostPlatform {
        HostPlatform::new("linux", "x86_64")
    }

    fn version() -> VersionDescriptor {
        serde_json::from_value(serde_json::json!({
            "id": "1.20",
            "mainClass": "net.minecraft.client.main.Main",
            "arguments": {
                "jvm": [
                    {"rules": [{"action": "allow", "os": {"name": "osx"}}], "value": ["-XstartOnFirstThread"]},
                    {"rules": [{"action": "allow", "os": {"name": "linux"}}], "value": "-Dlinux=yes"},
                    "-Djava.library.path=${natives_directory}",
                    "-Dminecraft.launcher.brand=${launcher_name}",
                    "-cp",
                    "${classpath}"
                ],
                "game": [
                    "--username", "${auth_player_name}",
                    "--version", "${version_name}",
                    "--gameDir", "${game_directory}",
                    "--assetsDir", "${assets_root}",
                    "--assetIndex", "${assets_index_name}",
                    "--uuid", "${auth_uuid}",
                    "--accessToken", "${auth_access_token}",
                    "--clientId", "${clientid}",
                    "--xuid", "${auth_xuid}",
                    "--userType", "${user_type}",
                    "--versionType", "${version_type}",
                    {"rules": [{"action": "allow", "features": {"is_demo_user": true}}], "value": "--demo"}
                ]
            },
            "logging": {"client": {
                "argument": "-Dlog4j.configurationFile=${path}",
                "file": {"id": "client-1.12.xml", "sha1": "x", "url": "u"}
            }},
            "libraries": [
                {"name": "a:one:1", "downloads": {"artifact": {"path": "a/one/1/one-1.jar", "sha1": "x", "url": "u"}}}
            ]
        }))
        .unwrap()
    }

    fn placeholders() -> LaunchPlaceholders {
        LaunchPlaceholders::new()
            .with(PlaceholderKey::NativesDirectory, ".")
            .with(PlaceholderKey::LauncherName, "Genecraft Launcher")
            .with(PlaceholderKey::LauncherVersion, "1.0")
            .with(PlaceholderKey::AuthPlayerName, "Steve")
            .with(PlaceholderKey::VersionName, "1.20")
            .with(PlaceholderKey::GameDirectory, "/root")
            .with(PlaceholderKey::AssetsRoot, "/root/assets")
            .with(PlaceholderKey::AssetsIndexName, "5")
            .with(PlaceholderKey::AuthUuid, "uuid-1")
            .with(PlaceholderKey::AuthAccessToken, "token-1")
            .with(PlaceholderKey::UserType, "msa")
            .with(PlaceholderKey::VersionType, "release")
            .with(PlaceholderKey::LibraryDirectory, "/root/libraries")
            .with(PlaceholderKey::Path, "/root/assets/log_cfgs/client-1.12.xml")
    }

    fn build(version: &VersionDescriptor, options: &RuntimeOptions) -> CommandLine {
        let host = linux();
        CommandLineBuilder::new(version, &host, Path::new("/root/libraries"), Path::new(JAR)).build(
            &placeholders(),
            &[PathBuf::from("/root/libraries/net/fabricmc/loader.jar")],
            &["-XX:+UseG1GC".to_string()],
            options,
        )
    }

    #[test]
    fn heap_rounding() {
        assert_eq!(heap_size_mb(3000), Some(3072));
        assert_eq!(heap_size_mb(500), Some(2048));
        assert_eq!(heap_size_mb(2048), Some(2048));
        assert_eq!(heap_size_mb(4096), Some(4096));
        assert_eq!(heap_size_mb(4097), Some(5120));
        assert_eq!(heap_size_mb(0), None);
    }

    #[test]
    fn jvm_args_follow_template_then_runtime_literals() {
        let options = RuntimeOptions {
            max_memory_mb: 3000,
            mod_loader: true,
            ..Default::default()
        };
        let cmd = build(&version(), &options);

        assert_eq!(
            cmd.jvm_args,
            vec![
                "-Dlinux=yes".to_string(),
                "-Djava.library.path=.".into(),
                "-Dminecraft.launcher.brand=\"Genecraft Launcher\"".into(),
                "-cp".into(),
                format!(
                    "/root/libraries/a/one/1/one-1.jar:/root/libraries/net/fabricmc/loader.jar:{}",
                    JAR
                ),
                "-XX:+UseG1GC".into(),
                MOD_LOADER_MARKER.into(),
                "-Xmx3072M".into(),
                "-Dlog4j.configurationFile=/root/assets/log_cfgs/client-1.12.xml".into(),
            ]
        );
    }

    #[test]
    fn unsupported_placeholders_drop_their_flags() {
        let cmd = build(&version(), &RuntimeOptions::default());

        assert!(!cmd.game_args.iter().any(|a| a == "--xuid" || a == "--clientId"));
        assert!(!cmd.game_args.iter().any(|a| a == "--demo"));
        assert_eq!(&cmd.game_args[..2], ["--username", "Steve"]);
        let token_at = cmd.game_args.iter().position(|a| a == "--accessToken").unwrap();
        assert_eq!(cmd.game_args[token_at + 1], "token-1");
        assert_eq!(&cmd.game_args[cmd.game_args.len() - 2..], ["--versionType", "release"]);
    }

    #[test]
    fn never_emits_unresolved_placeholders() {
        let game: Vec<ArgumentEntry> = PlaceholderKey::ALL
            .iter()
            .flat_map(|key| {
                [
                    ArgumentEntry::Literal(format!("--{}", key.as_str())),
                    ArgumentEntry::Literal(key.to_string()),
                    ArgumentEntry::Literal(format!("prefix-{}-suffix", key)),
                ]
            })
            .collect();
        let mut version = version();
        version.arguments.game = game.clone();
        version.arguments.jvm = game;

        let cmd = build(&version, &RuntimeOptions::default());
        for arg in cmd.jvm_args.iter().chain(&cmd.game_args) {
            assert!(!arg.contains("${"), "unresolved token in {:?}", arg);
        }
        // Supported keys still come through.
        assert!(cmd.game_args.contains(&"Steve".to_string()));
    }

    #[test]
    fn resolution_flags_need_both_dimensions() {
        let cmd = build(
            &version(),
            &RuntimeOptions {
                width: 854,
                height: 480,
                ..Default::default()
            },
        );
        assert_eq!(
            &cmd.game_args[cmd.game_args.len() - 4..],
            ["--width", "854", "--height", "480"]
        );

        let cmd = build(
            &version(),
            &RuntimeOptions {
                width: 854,
                ..Default::default()
            },
        );
        assert!(!cmd.game_args.contains(&"--width".to_string()));
    }

    #[test]
    fn verbatim_quoting_leaves_spaces_alone() {
        let cmd = build(
            &version(),
            &RuntimeOptions {
                quoting: ArgumentQuoting::Verbatim,
                ..Default::default()
            },
        );
        assert!(cmd
            .jvm_args
            .contains(&"-Dminecraft.launcher.brand=Genecraft Launcher".to_string()));
    }

    #[test]
    fn legacy_descriptor_gets_classpath_and_split_game_args() {
        let legacy: VersionDescriptor = serde_json::from_value(serde_json::json!({
            "id": "1.12.2",
            "mainClass": "net.minecraft.client.main.Main",
            "minecraftArguments": "--username ${auth_player_name} --version ${version_name} --userProperties {}"
        }))
        .unwrap();

        let cmd = build(&legacy, &RuntimeOptions::default());

        assert_eq!(&cmd.jvm_args[..2], ["-Djava.library.path=.", "-cp"]);
        assert!(cmd.jvm_args[2].ends_with(JAR));
        assert_eq!(
            cmd.game_args,
            vec!["--username", "Steve", "--version", "1.20", "--userProperties", "{}"]
        );
    }

    #[test]
    fn argv_places_main_class_between_lists() {
        let cmd = CommandLine {
            jvm_args: vec!["-Xmx2048M".into()],
            game_args: vec!["--demo".into()],
        };
        assert_eq!(cmd.argv("Main"), vec!["-Xmx2048M", "Main", "--demo"]);
    }
}
