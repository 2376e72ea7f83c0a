//! Command-line entry point for Sitelens website audits.

use anyhow::Context;
use clap::Parser;
use sitelens_audit::{AuditOrchestrator, ExtraArgs};
use sitelens_check::CheckRegistry;
use sitelens_checks::builtin_checks;
use sitelens_core::{AuditConfig, AuditReport, AuditStatus, Details, Verdict};
use std::io::{self, BufRead, Write};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Audit a website's quality and SEO posture.
#[derive(Debug, Parser)]
#[command(name = "sitelens", version, about)]
struct Cli {
    /// URL of the site to audit (prompted for when omitted)
    url: Option<String>,

    /// Workspace name forwarded to checks that declared it
    #[arg(long)]
    workspace: Option<String>,

    /// Repository slug forwarded to checks that declared it
    #[arg(long)]
    repo: Option<String>,

    /// Emit the report as JSON instead of a table
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sitelens=info")),
        )
        .with_writer(io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = AuditConfig::load_with_env().context("failed to load configuration")?;

    let url = match cli.url {
        Some(url) => url,
        None => prompt_for_url().context("failed to read URL from stdin")?,
    };
    let url = normalize_url(&url);
    debug!(url, "target resolved");

    let registry = CheckRegistry::load_from(&config, &builtin_checks());

    let mut extra = ExtraArgs::new();
    if let Some(workspace) = cli.workspace {
        extra.insert("workspace_name".to_string(), workspace);
    }
    if let Some(repo) = cli.repo {
        extra.insert("repo_slug".to_string(), repo);
    }

    let orchestrator = AuditOrchestrator::new(registry);
    let report = orchestrator.run(Some(&url), &extra).await;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        );
    } else {
        print!("{}", render_table(&report));
    }

    Ok(exit_code(&report))
}

fn prompt_for_url() -> io::Result<String> {
    print!("Enter the URL to audit: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

// Bare domains are the common way to invoke this; default them to HTTPS.
fn normalize_url(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

fn render_details(details: &Details) -> String {
    match details {
        Details::Text(text) => text.clone(),
        Details::Findings(map) => {
            serde_json::to_string(map).unwrap_or_else(|_| "(unrenderable findings)".to_string())
        }
    }
}

fn render_table(report: &AuditReport) -> String {
    let mut out = String::new();

    if report.status == AuditStatus::NoChecksLoaded {
        out.push_str("no checks loaded; nothing was audited\n");
        return out;
    }

    let module_width = report
        .validations
        .iter()
        .map(|outcome| outcome.module.as_str().len())
        .max()
        .unwrap_or(6)
        .max("module".len());

    out.push_str(&format!(
        "{:<module_width$}  {:<13}  details\n",
        "module", "result"
    ));
    let mut rows: Vec<_> = report.validations.iter().collect();
    rows.sort_by_key(|outcome| outcome.module.as_str());
    for outcome in rows {
        out.push_str(&format!(
            "{:<module_width$}  {:<13}  {}\n",
            outcome.module.as_str(),
            outcome.result.to_string(),
            render_details(&outcome.details)
        ));
    }

    if let Some(worst) = report.worst_verdict() {
        out.push_str(&format!("\noverall: {worst}\n"));
    }
    out
}

// 0: nothing worse than a warning. 1: at least one rejection or error.
// (2 is reserved for setup failures and is produced in main.)
fn exit_code(report: &AuditReport) -> i32 {
    match report.worst_verdict() {
        Some(Verdict::Rejected | Verdict::Error) => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitelens_core::{CheckId, CheckOutcome};

    fn report(verdicts: &[(&str, Verdict)]) -> AuditReport {
        AuditReport {
            url: Some("https://example.com".to_string()),
            validations: verdicts
                .iter()
                .map(|(id, verdict)| {
                    CheckOutcome::new(
                        CheckId::new(*id).expect("valid check ID"),
                        *verdict,
                        "details",
                    )
                })
                .collect(),
            status: AuditStatus::Completed,
        }
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("  example.com  "), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("https://example.com"), "https://example.com");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&report(&[("check_one", Verdict::Approved)])), 0);
        assert_eq!(exit_code(&report(&[("check_one", Verdict::Attention)])), 0);
        assert_eq!(
            exit_code(&report(&[
                ("check_one", Verdict::Approved),
                ("check_two", Verdict::Rejected)
            ])),
            1
        );
        assert_eq!(exit_code(&report(&[("check_one", Verdict::Error)])), 1);

        let empty = AuditReport {
            url: None,
            validations: vec![],
            status: AuditStatus::NoChecksLoaded,
        };
        assert_eq!(exit_code(&empty), 0);
    }

    #[test]
    fn test_render_table_rows_sorted_by_module() {
        let rendered = render_table(&report(&[
            ("zz_check", Verdict::Approved),
            ("aa_check", Verdict::Rejected),
        ]));
        let aa = rendered.find("aa_check").expect("aa_check row");
        let zz = rendered.find("zz_check").expect("zz_check row");
        assert!(aa < zz);
        assert!(rendered.contains("overall: reprovado"));
    }

    #[test]
    fn test_render_table_no_checks() {
        let empty = AuditReport {
            url: None,
            validations: vec![],
            status: AuditStatus::NoChecksLoaded,
        };
        assert!(render_table(&empty).contains("no checks loaded"));
    }
}
