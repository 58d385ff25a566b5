//! CLI entry point for admitguard.
//!
//! This module is intentionally thin: it handles argument parsing, logging setup, I/O, and
//! exit codes. All business logic lives in the `admitguard-app` crate.

use admitguard_app::{
    EvaluateInput, ExplainOutput, ReportVariant, ScanInput, admission_exit_code, read_check_set,
    read_report, render_annotations, render_markdown, run_evaluate, run_explain, run_scan_target,
    scan_exit_code, serialize_report,
};
use admitguard_domain::{RequestInfo, UserInfo};
use admitguard_settings::Overrides;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit code for unreadable or invalid input (policies, resources, check sets, reports).
const EXIT_INPUT_ERROR: u8 = 2;

#[derive(Parser, Debug)]
#[command(
    name = "admitguard",
    version,
    about = "Admission policy evaluation and compliance scoring"
)]
struct Cli {
    /// Log filter used when RUST_LOG is unset (error|warn|info|debug|trace).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log line format on stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate admission policies against resource documents.
    ///
    /// Exit code: 0 = allowed, 1 = blocked, 2 = input error.
    Evaluate {
        /// Policy directory (or a single policy file).
        policy_dir: Utf8PathBuf,

        /// Resource file; several YAML documents are evaluated separately.
        resource: Utf8PathBuf,

        /// Trust store for `verifyImages` rules.
        #[arg(long)]
        trust_store: Option<Utf8PathBuf>,

        /// Admission operation exposed as `request.operation`.
        #[arg(long, default_value = admitguard_domain::context::DEFAULT_OPERATION)]
        operation: String,

        /// Requesting user exposed as `request.userInfo.username`.
        #[arg(long)]
        user: Option<String>,

        /// Requesting user's groups (repeatable).
        #[arg(long = "group")]
        groups: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Run the compliance check battery against a target snapshot.
    ///
    /// Exit code: 0 = score at or above threshold, 1 = below, 2 = input error.
    Scan {
        /// Check-set file (admitguard.toml).
        check_set: Utf8PathBuf,

        /// Target snapshot (YAML or JSON).
        target: Utf8PathBuf,

        /// Admission policies evaluated by `admission.policy_violations`.
        #[arg(long)]
        policies: Option<Utf8PathBuf>,

        /// Trust store for `verifyImages` rules.
        #[arg(long)]
        trust_store: Option<Utf8PathBuf>,

        /// Override the environment profile (local|staging|production).
        #[arg(long)]
        profile: Option<String>,

        /// Override the pass threshold (0-100).
        #[arg(long)]
        threshold: Option<u32>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Render markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long)]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long)]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },

    /// Explain a check id or reason code with remediation guidance.
    Explain {
        /// The check id (e.g. "network.flow_logs") or reason code (e.g. "pattern-violation").
        identifier: String,
    },
}

#[derive(clap::Args, Debug)]
struct OutputArgs {
    /// Where to write the JSON report (if not specified, prints to stdout).
    #[arg(long)]
    report_out: Option<Utf8PathBuf>,

    /// Also write a Markdown summary to this path.
    #[arg(long)]
    markdown_out: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_level, cli.log_format) {
        eprintln!("admitguard error: {err:#}");
        return ExitCode::from(EXIT_INPUT_ERROR);
    }

    match run(cli.cmd) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "admitguard failed");
            eprintln!("admitguard error: {err:#}");
            ExitCode::from(EXIT_INPUT_ERROR)
        }
    }
}

fn init_logging(level: &str, format: LogFormat) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(level).with_context(|| format!("invalid --log-level {level}"))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);
    let installed = match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))
}

fn run(cmd: Commands) -> anyhow::Result<u8> {
    match cmd {
        Commands::Evaluate {
            policy_dir,
            resource,
            trust_store,
            operation,
            user,
            groups,
            output,
        } => cmd_evaluate(
            &policy_dir,
            &resource,
            trust_store.as_deref(),
            request_info(operation, user, groups),
            &output,
        ),
        Commands::Scan {
            check_set,
            target,
            policies,
            trust_store,
            profile,
            threshold,
            output,
        } => cmd_scan(
            &check_set,
            &target,
            policies.as_deref(),
            trust_store.as_deref(),
            Overrides {
                profile,
                pass_threshold: threshold,
            },
            &output,
        ),
        Commands::Md { report, output } => cmd_md(&report, output.as_deref()),
        Commands::Annotations { report, max } => cmd_annotations(&report, max),
        Commands::Explain { identifier } => Ok(cmd_explain(&identifier)),
    }
}

fn request_info(operation: String, user: Option<String>, groups: Vec<String>) -> RequestInfo {
    RequestInfo {
        operation,
        timestamp: None,
        user: user.map(|username| UserInfo { username, groups }),
    }
}

fn cmd_evaluate(
    policy_dir: &Utf8Path,
    resource: &Utf8Path,
    trust_store: Option<&Utf8Path>,
    request: RequestInfo,
    output: &OutputArgs,
) -> anyhow::Result<u8> {
    let result = run_evaluate(EvaluateInput {
        policy_dir,
        resources: resource,
        trust_store,
        request,
    })?;
    let code = admission_exit_code(&result.report);
    emit(&ReportVariant::Admission(result.report), output)?;
    Ok(exit_byte(code))
}

fn cmd_scan(
    check_set: &Utf8Path,
    target: &Utf8Path,
    policies: Option<&Utf8Path>,
    trust_store: Option<&Utf8Path>,
    overrides: Overrides,
    output: &OutputArgs,
) -> anyhow::Result<u8> {
    let config_text = read_check_set(check_set)?;
    let result = run_scan_target(ScanInput {
        config_text: &config_text,
        target,
        policy_dir: policies,
        trust_store,
        overrides,
    })?;
    let code = scan_exit_code(&result.report);
    emit(&ReportVariant::Compliance(result.report), output)?;
    Ok(exit_byte(code))
}

fn exit_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(EXIT_INPUT_ERROR)
}

/// Write the JSON report (file or stdout) and the optional Markdown summary.
fn emit(report: &ReportVariant, output: &OutputArgs) -> anyhow::Result<()> {
    let data = serialize_report(report)?;
    match &output.report_out {
        Some(path) => write_file(path, &data).context("write report json")?,
        None => println!("{}", String::from_utf8_lossy(&data)),
    }
    if let Some(path) = &output.markdown_out {
        write_file(path, render_markdown(report).as_bytes()).context("write markdown")?;
    }
    Ok(())
}

fn write_file(path: &Utf8Path, data: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_str().is_empty()
    {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {}", parent))?;
    }
    std::fs::write(path, data).with_context(|| format!("write {}", path))?;
    Ok(())
}

fn cmd_md(report_path: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<u8> {
    let md = render_markdown(&read_report(report_path)?);

    if let Some(out_path) = output {
        write_file(out_path, md.as_bytes()).context("write markdown output")?;
    } else {
        print!("{}", md);
    }

    Ok(0)
}

fn cmd_annotations(report_path: &Utf8Path, max: usize) -> anyhow::Result<u8> {
    for annotation in render_annotations(&read_report(report_path)?, max) {
        println!("{}", annotation);
    }
    Ok(0)
}

fn cmd_explain(identifier: &str) -> u8 {
    match run_explain(identifier) {
        ExplainOutput::Found {
            subject,
            explanation,
        } => {
            print!("{}", admitguard_app::format_explanation(&subject, &explanation));
            0
        }
        ExplainOutput::NotFound {
            identifier,
            available_check_ids,
            available_codes,
        } => {
            eprint!(
                "{}",
                admitguard_app::format_not_found(&identifier, available_check_ids, available_codes)
            );
            EXIT_INPUT_ERROR
        }
    }
}
