//! CLI entry point: reads one hook event from stdin (or `CLAUDE_TOOL_INPUT`
//! as a fallback), runs it through the validation core, and prints the
//! response envelope on stdout with the matching exit code (spec.md §6).

use std::io::Read as _;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use hookguard::config::Config;
use hookguard::gitquery::{GitQuery, GitQueryView};
use hookguard::hook::{self, EventKind};
use hookguard::response::Response;
use hookguard::rules::RuleEngine;
use hookguard::shell;
use hookguard::validator::{CancellationToken, DispatchConfig, Dispatcher, ValidationContext};
use hookguard::validators::build_registry;

/// Validation core for a hook dispatcher invoked by an AI coding assistant
/// before it executes a tool action.
#[derive(Debug, Parser)]
#[command(name = "hookguard", version, about)]
struct Cli {
    /// Overrides the event envelope's `hook_event_name` field.
    #[arg(long, value_name = "EVENT-KIND")]
    hook_type: Option<String>,

    /// Write a trace log at debug level to `.git/hookguard-logs/trace.log`.
    #[arg(long)]
    debug: bool,

    /// Write a trace log at trace level (more verbose than `--debug`).
    #[arg(long)]
    trace: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.debug || cli.trace {
        hookguard::diagnostic::init();
        env_logger::Builder::from_env(
            env_logger::Env::default()
                .default_filter_or(if cli.trace { "trace" } else { "debug" }),
        )
        .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off")).init();
    }

    match run(&cli) {
        Ok(response) => {
            let exit_code = response.exit_code();
            match serde_json::to_string(&response) {
                Ok(json) => println!("{json}"),
                Err(e) => {
                    eprintln!("hookguard: failed to serialize response: {e}");
                    return ExitCode::from(1);
                }
            }
            ExitCode::from(exit_code as u8)
        }
        Err(e) => {
            eprintln!("hookguard: {e}");
            ExitCode::from(1)
        }
    }
}

/// Internal-error edge per spec.md §7: bad config, an unexpected panic
/// surfaced as a dispatcher failure, or anything else that isn't a
/// validation verdict is reported here and exits 1, never 2.
fn run(cli: &Cli) -> anyhow::Result<Response> {
    let raw_input = read_event_input();
    let Some(raw_input) = raw_input else {
        // Empty stdin and no CLAUDE_TOOL_INPUT fallback: nothing to validate.
        return Ok(Response::allow());
    };

    let ctx = hook::parse_event(&raw_input, cli.hook_type.as_deref())
        .map_err(hookguard::DispatchError::InvalidEvent)
        .context("parsing hook event envelope")?;

    if ctx.event_kind == EventKind::Notification {
        emit_terminal_bell();
        return Ok(Response::allow());
    }

    if !ctx.requires_validation() {
        // PostToolUse and anything else that isn't PreToolUse passes
        // through untouched; only PreToolUse is validated (spec.md §3).
        return Ok(Response::allow());
    }

    let git = ctx
        .cwd
        .as_deref()
        .map(|cwd| GitQueryView::for_directory(Some(cwd)))
        .unwrap_or_else(|| GitQueryView::for_directory(None));

    let repo_root = git.repo_root().ok();
    let config = Config::load(repo_root.as_deref()).context("loading configuration")?;

    let pipeline = ctx
        .shell_command()
        .map(|command| match shell::parse_pipeline(command) {
            Ok(pipeline) => Some(Arc::new(pipeline)),
            Err(e) => {
                // A command we cannot parse is out of our jurisdiction
                // (spec.md §7): never block, just skip shell-aware checks.
                log::warn!("shell parse error: {e}");
                None
            }
        })
        .unwrap_or(None);

    let validation_ctx = Arc::new(ValidationContext {
        hook: Arc::new(ctx),
        pipeline,
        git,
    });

    let registry = build_registry(&config);

    let (rule_engine, rule_errors) = RuleEngine::compile(config.rules.clone());
    for err in &rule_errors {
        log::warn!("{err}");
    }
    if !rule_engine.is_empty() {
        if let Some(outcome) = rule_engine.evaluate(&validation_ctx, &registry) {
            return Ok(Response::from_rule_outcome(&outcome));
        }
    }

    let dispatch_config = DispatchConfig {
        general_workers: config
            .concurrency
            .general_workers
            .unwrap_or(DispatchConfig::default().general_workers),
        io_workers: config
            .concurrency
            .io_workers
            .unwrap_or(DispatchConfig::default().io_workers),
        global_timeout: config
            .concurrency
            .global_timeout_secs
            .map(std::time::Duration::from_secs)
            .unwrap_or(DispatchConfig::default().global_timeout),
    };
    let dispatcher = Dispatcher::new(registry, dispatch_config).context("building dispatcher")?;

    let outcome = dispatcher.dispatch(validation_ctx, &CancellationToken::new());
    Ok(Response::from_dispatch_outcome(&outcome))
}

/// Reads the event envelope from stdin; if stdin is empty, falls back to the
/// `CLAUDE_TOOL_INPUT` environment variable. Returns `None` if both are
/// empty, which the caller treats as "nothing to validate" (spec.md §6).
fn read_event_input() -> Option<String> {
    let mut buf = String::new();
    let _ = std::io::stdin().read_to_string(&mut buf);
    let trimmed = buf.trim();
    if !trimmed.is_empty() {
        return Some(buf);
    }

    std::env::var("CLAUDE_TOOL_INPUT")
        .ok()
        .filter(|s| !s.trim().is_empty())
}

/// Notification events never run validation; a terminal bell tells the
/// operator's terminal something happened, matching the host AI's own
/// notification convention (spec.md §3).
fn emit_terminal_bell() {
    eprint!("\x07");
}
