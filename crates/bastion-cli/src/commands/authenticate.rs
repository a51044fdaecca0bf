//! authenticate command - run one login through the admin gate

use super::{CommandContext, EXIT_DENIED, EXIT_ERROR, EXIT_OK};
use anyhow::{bail, Context, Result};
use bastion_auth::AuthenticationPipeline;
use bastion_core::types::{AuthorizationOutcome, Credential, RequestContext, Secret};
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::BufRead;

#[derive(Serialize)]
struct OutcomeReport<'a> {
    outcome: &'static str,
    status: u16,
    request_id: String,
    username: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    authorities: Option<&'a [String]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    attributes: Option<&'a BTreeMap<String, Vec<String>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn execute(
    ctx: &CommandContext,
    username: &str,
    password_env: &str,
    client_address: Option<String>,
) -> Result<u8> {
    let pipeline = AuthenticationPipeline::from_config(&ctx.config)
        .context("Failed to build authentication pipeline")?;

    let secret = read_secret(password_env)?;
    let credential = Credential::new(username, secret);

    let mut request = RequestContext::new();
    if let Some(address) = client_address {
        request = request.with_client_address(address);
    }

    let outcome = pipeline
        .authenticate_with_context(&request, &credential)
        .await;

    let report = OutcomeReport {
        outcome: outcome.code(),
        status: outcome.http_status(),
        request_id: request.request_id.to_string(),
        username,
        authorities: outcome.identity().map(|i| i.authorities.as_slice()),
        attributes: outcome.identity().map(|i| i.profile.attributes()),
        error: match &outcome {
            AuthorizationOutcome::Error(e) => Some(e.to_string()),
            _ => None,
        },
    };

    if ctx.is_json() {
        ctx.print_json(&report)?;
    } else {
        print_text(&report);
    }

    Ok(exit_code(&outcome))
}

fn exit_code(outcome: &AuthorizationOutcome) -> u8 {
    match outcome {
        AuthorizationOutcome::Granted(_) => EXIT_OK,
        AuthorizationOutcome::Denied(_) => EXIT_DENIED,
        AuthorizationOutcome::Error(_) => EXIT_ERROR,
    }
}

fn print_text(report: &OutcomeReport<'_>) {
    let label = match report.outcome {
        "Granted" => report.outcome.green(),
        "NotAuthenticated" | "Denied" => report.outcome.yellow(),
        _ => report.outcome.red(),
    };

    println!("{}: {} (request {})", label, report.username, report.request_id);

    if let Some(authorities) = report.authorities {
        println!("  authorities: {}", authorities.join(", "));
    }
    if let Some(error) = &report.error {
        println!("  cause: {}", error);
    }
}

/// Password from the named environment variable, otherwise one line of stdin
fn read_secret(password_env: &str) -> Result<Secret> {
    if let Ok(value) = std::env::var(password_env) {
        return Ok(Secret::new(value));
    }

    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    if read == 0 {
        bail!("No password given: set {} or pipe it on stdin", password_env);
    }

    let password = line.trim_end_matches(['\r', '\n']);
    Ok(Secret::new(password))
}
