// ─── Launch Placeholders ───
// The fixed set of `${key}` template variables and a tiny expander over them.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceholderKey {
    NativesDirectory,
    LauncherName,
    LauncherVersion,
    AuthPlayerName,
    VersionName,
    GameDirectory,
    AssetsRoot,
    AssetsIndexName,
    AuthUuid,
    AuthAccessToken,
    UserType,
    VersionType,
    LibraryDirectory,
    ClasspathSeparator,
    /// Computed by the command-line builder.
    Classpath,
    /// Logging configuration file.
    Path,
    /// Recognised but never populated; arguments using it are dropped.
    AuthXuid,
    /// Recognised but never populated; arguments using it are dropped.
    ClientId,
}

impl PlaceholderKey {
    pub const ALL: [PlaceholderKey; 18] = [
        PlaceholderKey::NativesDirectory,
        PlaceholderKey::LauncherName,
        PlaceholderKey::LauncherVersion,
        PlaceholderKey::AuthPlayerName,
        PlaceholderKey::VersionName,
        PlaceholderKey::GameDirectory,
        PlaceholderKey::AssetsRoot,
        PlaceholderKey::AssetsIndexName,
        PlaceholderKey::AuthUuid,
        PlaceholderKey::AuthAccessToken,
        PlaceholderKey::UserType,
        PlaceholderKey::VersionType,
        PlaceholderKey::LibraryDirectory,
        PlaceholderKey::ClasspathSeparator,
        PlaceholderKey::Classpath,
        PlaceholderKey::Path,
        PlaceholderKey::AuthXuid,
        PlaceholderKey::ClientId,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PlaceholderKey::NativesDirectory => "natives_directory",
            PlaceholderKey::LauncherName => "launcher_name",
            PlaceholderKey::LauncherVersion => "launcher_version",
            PlaceholderKey::AuthPlayerName => "auth_player_name",
            PlaceholderKey::VersionName => "version_name",
            PlaceholderKey::GameDirectory => "game_directory",
            PlaceholderKey::AssetsRoot => "assets_root",
            PlaceholderKey::AssetsIndexName => "assets_index_name",
            PlaceholderKey::AuthUuid => "auth_uuid",
            PlaceholderKey::AuthAccessToken => "auth_access_token",
            PlaceholderKey::UserType => "user_type",
            PlaceholderKey::VersionType => "version_type",
            PlaceholderKey::LibraryDirectory => "library_directory",
            PlaceholderKey::ClasspathSeparator => "classpath_separator",
            PlaceholderKey::Classpath => "classpath",
            PlaceholderKey::Path => "path",
            PlaceholderKey::AuthXuid => "auth_xuid",
            PlaceholderKey::ClientId => "clientid",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    pub fn is_unsupported(self) -> bool {
        matches!(self, PlaceholderKey::AuthXuid | PlaceholderKey::ClientId)
    }
}

impl fmt::Display for PlaceholderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}}}", self.as_str())
    }
}

/// How substituted values containing whitespace are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArgumentQuoting {
    /// Wrap in double quotes so a shell sees one token.
    #[default]
    ShellStyle,
    /// Leave untouched; for argv handed straight to the OS.
    Verbatim,
}

/// Ordered key → value mapping for one launch attempt.
#[derive(Debug, Clone, Default)]
pub struct LaunchPlaceholders {
    values: Vec<(PlaceholderKey, String)>,
}

impl LaunchPlaceholders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: PlaceholderKey, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// Unsupported keys are ignored; they never resolve.
    pub fn set(&mut self, key: PlaceholderKey, value: impl Into<String>) {
        if key.is_unsupported() {
            return;
        }
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.values.push((key, value)),
        }
    }

    pub fn get(&self, key: PlaceholderKey) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Expand every `${key}` in `template`. `None` means the argument must
    /// be elided: it references an unsupported, unknown or unset key, or
    /// contains an unterminated `${`.
    pub fn expand(&self, template: &str, quoting: ArgumentQuoting) -> Option<String> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("${") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let end = after.find('}')?;
            let key = PlaceholderKey::from_name(&after[..end])?;
            let value = self.get(key)?;
            out.push_str(&quote(value, quoting));
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Some(out)
    }
}

fn quote(value: &str, quoting: ArgumentQuoting) -> String {
    match quoting {
        ArgumentQuoting::ShellStyle if value.chars().any(char::is_whitespace) => {
            format!("\"{}\"", value)
        }
        _ => value.to_string(),
    }
}
