// ─── CLI Commands ───
// Thin shell over AppState: one subcommand per user action.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use crate::core::auth::{AuthChain, AuthError, AuthHandle, DeviceCodePrompt, PromptFn};
use crate::core::cancel::{CancelSource, CancelToken};
use crate::core::error::LauncherResult;
use crate::core::events::ProgressUpdate;
use crate::core::java;
use crate::core::profile::ClientSettings;
use crate::core::state::AppState;
use crate::core::system;

#[derive(Parser)]
#[command(
    name = "genecraft",
    version,
    about = "Genecraft Launcher - install, verify and launch Minecraft"
)]
pub struct Cli {
    /// Launcher config file (default: <root>/launcher.json)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
    /// Debug logging for the launcher itself
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sign in with a Microsoft account
    Login {
        /// Only use cached credentials
        #[arg(long)]
        quick: bool,
    },
    /// Download the mod loader, game files, assets and libraries
    Install,
    /// List missing or corrupt game files
    Verify,
    /// Sign in, verify and start the game
    Launch(LaunchArgs),
    /// Show paths, memory and the detected Java runtime
    Info,
}

#[derive(Args)]
pub struct LaunchArgs {
    /// Fail instead of prompting when no cached login exists
    #[arg(long)]
    pub quick: bool,
    /// Max heap in MB (0 = JVM default)
    #[arg(long, default_value_t = 0)]
    pub memory: u32,
    #[arg(long, default_value_t = 0)]
    pub width: u32,
    #[arg(long, default_value_t = 0)]
    pub height: u32,
    /// Extra JVM arguments, space separated
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub jvm_args: String,
}

impl From<&LaunchArgs> for ClientSettings {
    fn from(args: &LaunchArgs) -> Self {
        Self {
            memory: args.memory,
            width: args.width,
            height: args.height,
            jvm_args: args.jvm_args.clone(),
        }
    }
}

/// Run one command; the result is the process exit code.
pub async fn run(command: Command, state: AppState) -> LauncherResult<i32> {
    match command {
        Command::Login { quick } => login(&state, quick).await,
        Command::Install => install(&state).await,
        Command::Verify => verify(&state).await,
        Command::Launch(args) => launch(&state, &args).await,
        Command::Info => show_info(&state).await,
    }
}

async fn login(state: &AppState, quick: bool) -> LauncherResult<i32> {
    let chain = state.auth_chain(console_prompt());
    let handle = chain.authenticate(quick).await?;
    let profile = handle.profile().await?;
    println!("Signed in as {} ({})", profile.name, profile.id);
    Ok(0)
}

async fn install(state: &AppState) -> LauncherResult<i32> {
    let _observer = state.bus.register(print_progress);
    let cancel = cancel_on_ctrl_c();

    let report = state.installer().install_profile(&cancel).await?;
    println!(
        "Installed {}: {} file(s) downloaded, {} already present",
        report.version_id,
        report.downloaded(),
        report.skipped()
    );
    Ok(0)
}

async fn verify(state: &AppState) -> LauncherResult<i32> {
    let manager = state.profiles();
    let profile = manager.find_profile().await?;
    let missing = manager.verify(&profile).await?;

    if missing.is_empty() {
        println!("{}: all files present", profile.name);
        return Ok(0);
    }
    println!("{}: {} missing or corrupt file(s)", profile.name, missing.len());
    for name in &missing {
        println!("  {}", name);
    }
    Ok(1)
}

async fn launch(state: &AppState, args: &LaunchArgs) -> LauncherResult<i32> {
    let chain = state.auth_chain(console_prompt());
    let handle = sign_in(&chain, args.quick).await?;
    let auth = handle.launch_auth().await?;

    let _observer = state.bus.register(print_progress);
    let cancel = cancel_on_ctrl_c();
    let manager = state.profiles();
    let profile = manager.find_profile().await?;

    let status = manager
        .launch(&profile, &auth, &ClientSettings::from(args), &cancel)
        .await?;
    Ok(status.code().unwrap_or(1))
}

/// Cached login first; fall back to the interactive flow unless `quick`.
async fn sign_in(chain: &AuthChain, quick: bool) -> LauncherResult<AuthHandle> {
    match chain.authenticate(true).await {
        Ok(handle) => Ok(handle),
        Err(AuthError::QuickAuthUnavailable) if !quick => {
            info!("No cached login, starting interactive sign-in");
            Ok(chain.authenticate(false).await?)
        }
        Err(e) => Err(e.into()),
    }
}

async fn show_info(state: &AppState) -> LauncherResult<i32> {
    let paths = &state.paths;
    let hardware = system::hardware_info();

    println!("Root:        {}", paths.root().display());
    println!("Libraries:   {}", paths.libraries_dir().display());
    println!("Assets:      {}", paths.assets_dir().display());
    println!("Versions:    {}", paths.versions_dir().display());
    println!("Logs:        {}", paths.logs_dir().display());
    println!("Game:        {}", state.config.game_version);
    println!(
        "Host:        {} MB RAM, {} CPU(s)",
        hardware.total_memory_mb, hardware.cpu_count
    );

    let java_bin = java::resolve_java_binary(state.config.java_path.as_deref(), paths);
    match java::probe_java(&java_bin).await {
        Ok(found) => println!("Java:        {} ({})", found.version, found.path.display()),
        Err(e) => println!("Java:        not usable ({})", e),
    }
    Ok(0)
}

fn console_prompt() -> PromptFn {
    Arc::new(|prompt: &DeviceCodePrompt| match &prompt.message {
        Some(message) => println!("{}", message),
        None => println!(
            "To sign in, open {} and enter the code {}",
            prompt.verification_uri, prompt.user_code
        ),
    })
}

fn print_progress(update: &ProgressUpdate) {
    println!("[{:>5.1}%] {}", update.percentage, update.message);
}

fn cancel_on_ctrl_c() -> CancelToken {
    let source = CancelSource::new();
    let token = source.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            source.cancel();
        }
    });
    token
}
