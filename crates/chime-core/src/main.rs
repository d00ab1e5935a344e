//! chime - completion notifications for coding agents
//!
//! The main entry point, handling:
//! - Sending a notification styled for the agent that invoked chime
//! - Installing and removing the completion hook in agent tool configs
//! - Reporting per-tool hook status

use chime_common::{AgentKind, OutputFormat};
use chime_core::config::{self, PresetOverride};
use chime_core::detect::{detect_live, SignatureTable};
use chime_core::exit_codes::ExitCode;
use chime_core::hooks::{HookError, InstallContext, Installer, TargetReport, TargetStatus};
use chime_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use chime_core::notify::{icon::resolve_icon, send_best_effort, Notification, SystemNotifier};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

/// Desktop notifications for coding agents, styled per agent
#[derive(Parser)]
#[command(name = "chime")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    notify: NotifyArgs,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Output format for command results
    #[arg(long, global = true, default_value = "human")]
    format: OutputFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log line format on stderr (human, jsonl)
    #[arg(long, global = true, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
}

#[derive(Args, Debug)]
struct NotifyArgs {
    /// Notification body
    #[arg(default_value = "Done")]
    message: String,

    /// Override the preset title
    #[arg(short, long)]
    title: Option<String>,

    /// Use this agent's preset instead of detecting the caller
    #[arg(short, long, value_name = "AGENT")]
    preset: Option<AgentKind>,

    /// Override the preset sound
    #[arg(short, long)]
    sound: Option<String>,

    /// Trace the ancestry walk to stderr
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the completion hook into one target, or every detected target
    Install {
        /// Target id (claude, gemini, copilot)
        target: Option<String>,
    },

    /// Remove the completion hook from every target that has it
    Uninstall,

    /// Show detected/installed state per target
    Status,
}

fn main() {
    let cli = Cli::parse();

    let cli_level = (cli.global.verbose > 0 || cli.global.quiet)
        .then(|| LogLevel::from_verbosity(cli.global.verbose, cli.global.quiet));
    init_logging(&LogConfig::from_env(cli_level, cli.global.log_format));

    let exit_code = match cli.command {
        None => run_notify(&cli.global, &cli.notify),
        Some(Commands::Install { target }) => run_install(&cli.global, target.as_deref()),
        Some(Commands::Uninstall) => run_uninstall(&cli.global),
        Some(Commands::Status) => run_status(&cli.global),
    };

    tracing::debug!(exit = %exit_code, "exiting");
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Notification
// ============================================================================

#[derive(Serialize)]
struct NotifyReport<'a> {
    agent: AgentKind,
    detected: bool,
    title: &'a str,
    body: &'a str,
    sound: Option<&'a str>,
    icon: Option<String>,
    delivered: bool,
}

fn run_notify(global: &GlobalOpts, args: &NotifyArgs) -> ExitCode {
    let loaded = config::load_or_default();

    let agent = match args.preset {
        Some(agent) => {
            if args.debug {
                eprintln!("preset '{}' given, skipping detection", agent);
            }
            agent
        }
        None => {
            detect_live(
                &SignatureTable::builtin(),
                loaded.config.max_depth,
                args.debug,
            )
            .agent
        }
    };

    let cli_override = PresetOverride {
        title: args.title.clone(),
        sound: args.sound.clone(),
        icon: None,
    };
    let preset = loaded.config.preset_for(agent, &cli_override);
    let notification = Notification {
        title: preset.title,
        body: args.message.clone(),
        sound: preset.sound,
        icon: preset.icon.as_deref().and_then(resolve_icon),
    };

    let delivered = send_best_effort(&SystemNotifier::new(), &notification);

    match global.format {
        OutputFormat::Json => print_json(&NotifyReport {
            agent,
            detected: args.preset.is_none(),
            title: &notification.title,
            body: &notification.body,
            sound: notification.sound.as_deref(),
            icon: notification.icon.as_ref().map(|p| p.display().to_string()),
            delivered,
        }),
        OutputFormat::Human => ExitCode::Clean,
    }
}

// ============================================================================
// Hook management
// ============================================================================

fn installer(global: &GlobalOpts) -> Result<Installer, ExitCode> {
    InstallContext::from_env()
        .map(Installer::new)
        .map_err(|err| fail(global, &err))
}

/// Report `err` on stderr, as a JSON object when `--format json` is set.
fn fail(global: &GlobalOpts, err: &HookError) -> ExitCode {
    let code = ExitCode::for_hook_error(err);
    match global.format {
        OutputFormat::Json => {
            let response = serde_json::json!({
                "status": "error",
                "error": {
                    "code": code.code_name(),
                    "exit_code": code.as_i32(),
                    "message": err.to_string(),
                }
            });
            eprintln!("{}", response);
        }
        OutputFormat::Human => eprintln!("chime: {}", err),
    }
    code
}

fn run_install(global: &GlobalOpts, target: Option<&str>) -> ExitCode {
    let installer = match installer(global) {
        Ok(i) => i,
        Err(code) => return code,
    };

    let Some(name) = target else {
        let reports = installer.install_all();
        if reports.is_empty() && global.format == OutputFormat::Human {
            println!("No supported agent tools detected.");
            return ExitCode::Clean;
        }
        return print_reports(global, &reports);
    };

    match installer.install_named(name) {
        Ok((target, outcome)) => {
            let report = TargetReport {
                target,
                config_path: installer.config_path(target),
                status: outcome.into(),
            };
            print_reports(global, std::slice::from_ref(&report))
        }
        Err(err) => fail(global, &err),
    }
}

fn run_uninstall(global: &GlobalOpts) -> ExitCode {
    let installer = match installer(global) {
        Ok(i) => i,
        Err(code) => return code,
    };

    let reports = installer.uninstall_all();
    if reports.is_empty() && global.format == OutputFormat::Human {
        println!("No chime hooks installed.");
        return ExitCode::Clean;
    }
    print_reports(global, &reports)
}

fn run_status(global: &GlobalOpts) -> ExitCode {
    let installer = match installer(global) {
        Ok(i) => i,
        Err(code) => return code,
    };

    let statuses = installer.status();
    match global.format {
        OutputFormat::Json => print_json(&statuses),
        OutputFormat::Human => {
            print_status_table(&statuses);
            ExitCode::Clean
        }
    }
}

// ============================================================================
// Output
// ============================================================================

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

fn print_status_table(statuses: &[TargetStatus]) {
    println!("{:<9} {:<16} {:<9} {:<10} CONFIG", "TARGET", "NAME", "DETECTED", "INSTALLED");
    for s in statuses {
        println!(
            "{:<9} {:<16} {:<9} {:<10} {}",
            s.target.id,
            s.target.display_name,
            yes_no(s.detected),
            yes_no(s.installed),
            s.config_path.display()
        );
    }
}

fn print_reports(global: &GlobalOpts, reports: &[TargetReport]) -> ExitCode {
    let failed = reports.iter().filter(|r| r.status.is_failure()).count();

    let code = match global.format {
        OutputFormat::Json => print_json(reports),
        OutputFormat::Human => {
            for r in reports {
                let symbol = if r.status.is_failure() { "✗" } else { "✓" };
                println!(
                    "{} {:<9} {} ({})",
                    symbol,
                    r.target.id,
                    r.status.label(),
                    r.config_path.display()
                );
            }
            ExitCode::Clean
        }
    };

    if failed > 0 && code.is_success() {
        ExitCode::PartialFail
    } else {
        code
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            ExitCode::Clean
        }
        Err(err) => {
            eprintln!("chime: failed to serialize output: {}", err);
            ExitCode::InternalError
        }
    }
}
