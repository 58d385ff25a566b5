//! Developer tasks (schema generation, golden checks, explain coverage).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use admitguard_test_util::normalize_nondeterministic;
use anyhow::{Context, bail};
use schemars::schema_for;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> anyhow::Result<PathBuf> {
    let manifest_dir = match std::env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => std::env::current_dir().context("Cannot determine current directory")?,
    };

    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map(Path::to_path_buf)
            .context("xtask has no parent")
    } else {
        Ok(manifest_dir)
    }
}

fn schemas_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("schemas"))
}

fn fixtures_dir() -> anyhow::Result<PathBuf> {
    Ok(project_root()?.join("tests").join("fixtures"))
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_admission_schema() -> schemars::Schema {
    schema_for!(admitguard_types::AdmissionReport)
}

fn generate_compliance_schema() -> schemars::Schema {
    schema_for!(admitguard_types::ComplianceReport)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(admitguard_settings::AdmitguardConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "admitguard.admission.v1.json",
            generate: generate_admission_schema,
        },
        SchemaSpec {
            filename: "admitguard.compliance.v1.json",
            generate: generate_compliance_schema,
        },
        SchemaSpec {
            filename: "admitguard.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Report schema id -> generated schema file.
fn report_schema_file(schema_id: &str) -> Option<&'static str> {
    match schema_id {
        admitguard_types::SCHEMA_ADMISSION_REPORT_V1 => Some("admitguard.admission.v1.json"),
        admitguard_types::SCHEMA_COMPLIANCE_REPORT_V1 => Some("admitguard.compliance.v1.json"),
        _ => None,
    }
}

/// Golden report and the CLI arguments (relative to `tests/fixtures`) that produce it.
struct GoldenRun {
    golden: &'static str,
    args: &'static [&'static str],
    exit_code: i32,
}

const GOLDEN_RUNS: &[GoldenRun] = &[
    GoldenRun {
        golden: "evaluate-untagged.report.json",
        args: &["evaluate", "policies", "resources/untagged-pod.yaml"],
        exit_code: 1,
    },
    GoldenRun {
        golden: "scan-iam-noncompliant.report.json",
        args: &["scan", "check-sets/iam-only.toml", "targets/noncompliant.yaml"],
        exit_code: 1,
    },
];

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Validate that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir()?;
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }

    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {}", name);
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {}", name);
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Validate golden reports against the generated report schemas");
    eprintln!("  conform-full      conform + run the admitguard binary and diff against goldens");
    eprintln!("  explain-coverage  Validate all check IDs and reason codes have explanations");
}

fn compile_schema(schema: &schemars::Schema) -> anyhow::Result<jsonschema::Validator> {
    let value = serde_json::to_value(schema).context("Failed to convert schema to JSON")?;
    jsonschema::validator_for(&value).map_err(|e| anyhow::anyhow!("Failed to compile schema: {e}"))
}

/// Schema errors for one report, or an error naming an unknown schema id.
fn report_schema_errors(name: &str, report: &Value) -> Vec<String> {
    let schema_id = report.get("schema").and_then(Value::as_str).unwrap_or_default();
    let Some(filename) = report_schema_file(schema_id) else {
        return vec![format!("{name}: unknown schema '{schema_id}'")];
    };
    let Some(spec) = schema_specs().into_iter().find(|s| s.filename == filename) else {
        return vec![format!("{name}: no generator for {filename}")];
    };
    let validator = match compile_schema(&(spec.generate)()) {
        Ok(v) => v,
        Err(e) => return vec![format!("{name}: {e:#}")],
    };
    validator
        .iter_errors(report)
        .map(|err| format!("{name}: schema validation: {err}"))
        .collect()
}

/// Reason tokens are kebab-case, optionally followed by `:detail`.
fn is_valid_reason(reason: &str) -> bool {
    let code = reason.split_once(':').map_or(reason, |(code, _)| code);
    let mut chars = code.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}

fn reason_errors(name: &str, report: &Value) -> Vec<String> {
    let mut errors = Vec::new();
    for decision in report["decisions"].as_array().into_iter().flatten() {
        for policy in decision["policies"].as_array().into_iter().flatten() {
            for violation in policy["violations"].as_array().into_iter().flatten() {
                let reason = violation["reason"].as_str().unwrap_or_default();
                if !is_valid_reason(reason) {
                    errors.push(format!("{name}: reason '{reason}' is not a valid token"));
                }
            }
        }
    }
    errors
}

/// Validate every golden report against its generated schema.
fn conform() -> anyhow::Result<()> {
    let golden_dir = fixtures_dir()?.join("golden");
    let mut count = 0;
    let mut errors = Vec::new();

    let mut entries: Vec<PathBuf> = fs::read_dir(&golden_dir)
        .with_context(|| format!("Failed to read {}", golden_dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    entries.sort();

    for path in entries {
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        let content =
            fs::read_to_string(&path).with_context(|| format!("Failed to read {}", name))?;
        let value: Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {} as JSON", name))?;

        let mut found = report_schema_errors(&name, &value);
        found.extend(reason_errors(&name, &value));
        if found.is_empty() {
            println!("  ✓ {} validates", name);
        }
        errors.extend(found);
        count += 1;
    }

    if count == 0 {
        bail!("No golden reports found in {}", golden_dir.display());
    }
    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ All {} golden reports pass conformance checks!", count);
    Ok(())
}

/// conform + run the built binary for each golden and compare normalized output.
fn conform_full() -> anyhow::Result<()> {
    conform()?;

    println!("\n--- Full conformance: admitguard binary output ---\n");

    let root = project_root()?;
    let bin = root.join("target").join("debug").join("admitguard");
    #[cfg(target_os = "windows")]
    let bin = bin.with_extension("exe");
    if !bin.exists() {
        bail!(
            "admitguard binary not found at {}.\nRun `cargo build -p admitguard-cli` first.",
            bin.display()
        );
    }

    let fixtures = fixtures_dir()?;
    let mut errors = Vec::new();

    for run in GOLDEN_RUNS {
        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let report_out = temp_dir.path().join("report.json");

        let mut cmd = std::process::Command::new(&bin);
        cmd.arg(run.args[0]);
        for rel in &run.args[1..] {
            cmd.arg(fixtures.join(rel));
        }
        let output = cmd
            .arg("--report-out")
            .arg(&report_out)
            .output()
            .with_context(|| format!("Failed to run admitguard for '{}'", run.golden))?;

        if output.status.code() != Some(run.exit_code) {
            errors.push(format!(
                "{}: admitguard exited with {:?} (expected {}): {}",
                run.golden,
                output.status.code(),
                run.exit_code,
                String::from_utf8_lossy(&output.stderr)
            ));
            continue;
        }

        let actual: Value = serde_json::from_str(
            &fs::read_to_string(&report_out)
                .with_context(|| format!("{}: no report output generated", run.golden))?,
        )?;
        errors.extend(report_schema_errors(run.golden, &actual));

        let golden_path = fixtures.join("golden").join(run.golden);
        let golden: Value = serde_json::from_str(&fs::read_to_string(&golden_path)?)?;
        if normalize_nondeterministic(actual) != normalize_nondeterministic(golden) {
            errors.push(format!("{}: output differs from golden file", run.golden));
        } else {
            println!("  ✓ {} matches", run.golden);
        }
    }

    if !errors.is_empty() {
        eprintln!("\nFull conformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!("Full conformance validation failed with {} errors", errors.len());
    }

    println!("\n✓ Full conformance checks passed!");
    Ok(())
}

/// Validate that all check IDs and codes have explanations.
fn explain_coverage() -> anyhow::Result<()> {
    use admitguard_types::explain::{all_check_ids, all_codes, lookup_explanation};

    let mut errors = Vec::new();
    for (kind, ids) in [("Check ID", all_check_ids()), ("Code", all_codes())] {
        for id in ids {
            match lookup_explanation(id) {
                Some(exp) => {
                    if exp.title.is_empty() {
                        errors.push(format!("{kind} '{id}' has empty title"));
                    }
                    if exp.description.is_empty() {
                        errors.push(format!("{kind} '{id}' has empty description"));
                    }
                    if exp.remediation.is_empty() {
                        errors.push(format!("{kind} '{id}' has empty remediation"));
                    }
                }
                None => errors.push(format!("{kind} '{id}' has no explanation")),
            }
        }
    }

    if errors.is_empty() {
        println!("✓ {} check IDs have explanations", all_check_ids().len());
        println!("✓ {} codes have explanations", all_codes().len());
        println!("\n✓ All explain coverage checks passed!");
        Ok(())
    } else {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!("Explain coverage validation failed with {} errors", errors.len())
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "conform-full" => conform_full(),
        "explain-coverage" => explain_coverage(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
