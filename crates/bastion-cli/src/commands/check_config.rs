//! check-config command - validate configuration without contacting the directory

use super::{CommandContext, EXIT_OK};
use anyhow::Result;
use bastion_core::config::{AuthenticationType, BastionConfig};
use colored::Colorize;
use serde::Serialize;

#[derive(Serialize)]
struct ConfigSummary<'a> {
    server_url: &'a str,
    auth_type: &'static str,
    start_tls: bool,
    user_base_dn: &'a str,
    user_filter: &'a str,
    allowed_roles: Vec<&'a str>,
    generators: Vec<&'static str>,
}

fn summarize(config: &BastionConfig) -> ConfigSummary<'_> {
    ConfigSummary {
        server_url: &config.ldap.server_url,
        auth_type: match config.ldap.auth_type {
            AuthenticationType::Authenticated => "authenticated",
            AuthenticationType::Anonymous => "anonymous",
            AuthenticationType::Direct => "direct",
        },
        start_tls: config.ldap.start_tls,
        user_base_dn: &config.ldap.user_base_dn,
        user_filter: config.ldap.user_filter(),
        allowed_roles: config.admin.allowed_roles.iter().map(String::as_str).collect(),
        generators: config.generators.iter().map(|g| g.kind()).collect(),
    }
}

pub fn execute(ctx: &CommandContext) -> Result<u8> {
    ctx.config.validate()?;

    let summary = summarize(&ctx.config);

    if ctx.is_json() {
        ctx.print_json(&summary)?;
        return Ok(EXIT_OK);
    }

    println!("{}", "Configuration is valid".green());
    println!("  server:        {}", summary.server_url);
    println!("  auth type:     {}", summary.auth_type);
    println!("  user base DN:  {}", summary.user_base_dn);
    println!("  user filter:   {}", summary.user_filter);
    println!("  admin roles:   {}", summary.allowed_roles.join(", "));
    println!("  generators:    {}", summary.generators.join(" -> "));

    if summary.allowed_roles.is_empty() {
        println!("{}", "  warning: no admin roles, every login will be denied".yellow());
    }

    Ok(EXIT_OK)
}
