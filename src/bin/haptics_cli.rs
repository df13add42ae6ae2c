use std::ffi::CString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use haptic_player::bridge::trampoline;
use haptic_player::bridge::{DesktopStubBridge, StubCall};
use haptic_player::config::AppConfig;
use haptic_player::error::ErrorCode;
use haptic_player::logging::init_logging;
use haptic_player::presets::Preset;
use haptic_player::telemetry::{TelemetryHub, TelemetrySnapshot};
use haptic_player::{AndroidBuiltInEffect, AssetRoot, HapticsContext, IosBuiltInEffect};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "haptics_cli",
    about = "Asset sandbox checks and desktop playback simulation for the haptics bridge"
)]
struct Cli {
    /// JSON config file (defaults to assets/haptics_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check relative asset paths against the sandbox root
    ///
    /// Without paths, every custom preset in the config is checked.
    Validate {
        /// Override the configured asset root
        #[arg(long)]
        root: Option<PathBuf>,
        paths: Vec<String>,
    },
    /// Convert an absolute path into a root-relative asset path
    Resolve {
        #[arg(long)]
        root: Option<PathBuf>,
        absolute: PathBuf,
    },
    /// List built-in effects and their native names
    Effects,
    /// Drive one play request through a simulated native player
    Simulate {
        #[arg(long, value_enum)]
        platform: SimPlatform,
        #[arg(long, default_value = "AndroidSamples/Button.hac")]
        android_path: String,
        #[arg(long, default_value = "Samples/Button.ahap")]
        ios_path: String,
        /// Make the native call itself fail with this message
        #[arg(long)]
        dispatch_failure: Option<String>,
        /// Have the native player report this failure instead of completion
        #[arg(long)]
        native_failure: Option<String>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum SimPlatform {
    Android,
    Ios,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            AppConfig::load_from_file(path)
        }
        None => AppConfig::load(),
    };
    init_logging(&config.logging.level);

    match cli.command {
        Commands::Validate { root, paths } => run_validate(&config, root, paths),
        Commands::Resolve { root, absolute } => run_resolve(&config, root, absolute),
        Commands::Effects => run_effects(),
        Commands::Simulate {
            platform,
            android_path,
            ios_path,
            dispatch_failure,
            native_failure,
        } => run_simulate(
            config,
            platform,
            &android_path,
            &ios_path,
            dispatch_failure,
            native_failure,
        ),
    }
}

fn asset_root(config: &AppConfig, root: Option<PathBuf>) -> AssetRoot {
    match root {
        Some(root) => {
            AssetRoot::new(root).with_ios_bundle_prefix(&config.assets.ios_bundle_prefix)
        }
        None => config.asset_root(),
    }
}

#[derive(Serialize)]
struct ValidationEntry {
    name: String,
    valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ValidationEntry {
    fn new<E: ErrorCode>(name: String, result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self {
                name,
                valid: true,
                code: None,
                error: None,
            },
            Err(err) => Self {
                name,
                valid: false,
                code: Some(err.code()),
                error: Some(err.message()),
            },
        }
    }
}

fn run_validate(config: &AppConfig, root: Option<PathBuf>, paths: Vec<String>) -> Result<ExitCode> {
    let assets = asset_root(config, root);

    let entries: Vec<ValidationEntry> = if paths.is_empty() {
        config
            .presets
            .iter()
            .filter(|(_, preset)| matches!(preset, Preset::Custom(_)))
            .map(|(name, preset)| ValidationEntry::new(name.clone(), preset.validate(&assets)))
            .collect()
    } else {
        paths
            .into_iter()
            .map(|path| {
                let result = assets.check(&path).map(|_| ());
                ValidationEntry::new(path, result)
            })
            .collect()
    };

    println!("{}", serde_json::to_string_pretty(&entries)?);

    if entries.iter().all(|entry| entry.valid) {
        Ok(ExitCode::from(0))
    } else {
        Ok(ExitCode::from(2))
    }
}

fn run_resolve(config: &AppConfig, root: Option<PathBuf>, absolute: PathBuf) -> Result<ExitCode> {
    let assets = asset_root(config, root);
    match assets.resolve(&absolute) {
        Some(relative) => {
            println!("{relative}");
            Ok(ExitCode::from(0))
        }
        None => {
            eprintln!(
                "{} is not inside {}",
                absolute.display(),
                assets.path().display()
            );
            Ok(ExitCode::from(2))
        }
    }
}

#[derive(Serialize)]
struct EffectEntry {
    effect: String,
    native_name: &'static str,
}

#[derive(Serialize)]
struct EffectsPayload {
    android: Vec<EffectEntry>,
    ios: Vec<EffectEntry>,
}

fn run_effects() -> Result<ExitCode> {
    let payload = EffectsPayload {
        android: AndroidBuiltInEffect::ALL
            .iter()
            .map(|effect| EffectEntry {
                effect: format!("{:?}", effect),
                native_name: effect.native_name(),
            })
            .collect(),
        ios: IosBuiltInEffect::ALL
            .iter()
            .map(|effect| EffectEntry {
                effect: format!("{:?}", effect),
                native_name: effect.native_name(),
            })
            .collect(),
    };
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(ExitCode::from(0))
}

#[derive(Serialize, Clone)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
enum SimOutcome {
    Completed,
    Failed(String),
    Pending,
}

#[derive(Serialize)]
struct SimulationReport {
    platform: &'static str,
    outcome: SimOutcome,
    calls: Vec<StubCall>,
    pending_after: usize,
    telemetry: TelemetrySnapshot,
}

fn run_simulate(
    config: AppConfig,
    platform: SimPlatform,
    android_path: &str,
    ios_path: &str,
    dispatch_failure: Option<String>,
    native_failure: Option<String>,
) -> Result<ExitCode> {
    let stub = Arc::new(match platform {
        SimPlatform::Android => DesktopStubBridge::android(),
        SimPlatform::Ios => DesktopStubBridge::ios(),
    });
    if let Some(reason) = &dispatch_failure {
        stub.fail_with(reason.clone());
    }

    let telemetry = Arc::new(TelemetryHub::default());
    let context = HapticsContext::with_bridge(config, stub.clone())
        .with_telemetry(Arc::clone(&telemetry));
    let gateway = context.gateway();

    let outcome = Arc::new(Mutex::new(SimOutcome::Pending));
    let on_complete = Arc::clone(&outcome);
    let on_fail = Arc::clone(&outcome);
    gateway.play(
        android_path,
        &context.assets().ios_bundle_path(ios_path),
        Some(Box::new(move || {
            if let Ok(mut slot) = on_complete.lock() {
                *slot = SimOutcome::Completed;
            }
        })),
        Some(Box::new(move |message: String| {
            if let Ok(mut slot) = on_fail.lock() {
                *slot = SimOutcome::Failed(message);
            }
        })),
    );

    match platform {
        SimPlatform::Android => {
            // The object-call player has no failure channel after dispatch.
            if native_failure.is_some() {
                eprintln!("--native-failure has no effect on the android player");
            }
            stub.complete_next_proxy();
        }
        SimPlatform::Ios => {
            let (complete, fail) = trampoline::entry_points();
            for id in stub.take_correlated() {
                match &native_failure {
                    Some(reason) => {
                        let message = CString::new(reason.as_str())
                            .context("native failure message contains a NUL byte")?;
                        fail(id.get(), message.as_ptr());
                    }
                    None => complete(id.get()),
                }
                // Duplicate signal; must be ignored.
                complete(id.get());
            }
        }
    }

    let pending_after = gateway.registry().pending();
    drop(gateway);
    context.teardown().context("releasing simulated player")?;

    let outcome = outcome
        .lock()
        .map(|slot| slot.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone());
    let exit = match outcome {
        SimOutcome::Completed => 0,
        SimOutcome::Failed(_) | SimOutcome::Pending => 2,
    };

    let report = SimulationReport {
        platform: match platform {
            SimPlatform::Android => "android",
            SimPlatform::Ios => "ios",
        },
        outcome,
        calls: stub.calls(),
        pending_after,
        telemetry: telemetry.snapshot(),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(ExitCode::from(exit))
}
