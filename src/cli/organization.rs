use crate::cli::CliContext;
use crate::core::audit_log::AuditRecord;
use crate::core::store;
use anyhow::Result;
use clap::{Args, Subcommand};

/// Organization names are compared after trimming surrounding whitespace.
/// A blank result is left empty for callers that treat it as absent.
pub(crate) fn trim_organization_name(s: &str) -> Result<String, String> {
    Ok(s.trim().to_string())
}

pub(crate) fn parse_organization_name(s: &str) -> Result<String, String> {
    let trimmed = trim_organization_name(s)?;
    if trimmed.is_empty() {
        return Err("organization name cannot be empty".into());
    }
    Ok(trimmed)
}

#[derive(Subcommand, Debug)]
pub enum OrganizationCommand {
    /// Register an organization
    Add(OrganizationAddArgs),
}

#[derive(Args, Debug)]
pub struct OrganizationAddArgs {
    /// Organization name
    #[arg(value_parser = parse_organization_name)]
    pub name: String,
}

pub fn run(ctx: &CliContext, cmd: OrganizationCommand) -> Result<()> {
    match cmd {
        OrganizationCommand::Add(args) => run_add(ctx, args),
    }
}

fn run_add(ctx: &CliContext, args: OrganizationAddArgs) -> Result<()> {
    let created = store::transaction(&ctx.paths, |store| -> Result<bool> {
        Ok(store.ensure_organization(&args.name))
    })?;

    if created {
        ctx.audit(AuditRecord::new("organization.create", &args.name));
        println!("Created '{}' organization.", args.name);
    } else {
        println!("Organization '{}' already exists.", args.name);
    }
    println!("(changed: {})", if created { "True" } else { "False" });
    Ok(())
}
