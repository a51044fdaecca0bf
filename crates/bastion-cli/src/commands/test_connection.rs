//! test-connection command - check that the directory is reachable

use super::{CommandContext, EXIT_ERROR, EXIT_OK};
use anyhow::Result;
use bastion_auth::LdapDirectoryClient;
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct ConnectionReport {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_info: Option<bastion_auth::LdapServerInfo>,
}

pub async fn execute(ctx: &CommandContext) -> Result<u8> {
    let client = LdapDirectoryClient::new(ctx.config.ldap.clone());

    let report = match client.test_connection().await {
        Ok(info) => ConnectionReport {
            success: true,
            message: "Connection successful".to_string(),
            server_info: Some(info),
        },
        Err(e) => ConnectionReport {
            success: false,
            message: e,
            server_info: None,
        },
    };

    if ctx.is_json() {
        ctx.print_json(&report)?;
    } else if report.success {
        println!("{}: {}", "ok".green(), client.config().server_url);
        if let Some(info) = &report.server_info {
            if let Some(vendor) = &info.vendor {
                println!("  vendor:          {} {}", vendor, info.version.as_deref().unwrap_or(""));
            }
            println!("  naming contexts: {}", info.naming_contexts.join(", "));
        }
    } else {
        println!("{}: {}", "failed".red(), report.message);
    }

    Ok(if report.success { EXIT_OK } else { EXIT_ERROR })
}
