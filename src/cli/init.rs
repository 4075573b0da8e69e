use crate::cli::organization::parse_organization_name;
use crate::cli::CliContext;
use crate::constants;
use crate::core::audit_log::AuditRecord;
use crate::core::store;
use crate::util::fs as store_fs;
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Also register this organization
    #[arg(long, value_name = "NAME", value_parser = parse_organization_name)]
    pub organization: Option<String>,
}

pub fn run(ctx: &CliContext, args: InitArgs) -> Result<()> {
    let paths = &ctx.paths;
    store_fs::ensure_dir(&paths.root, constants::ROOT_DIR_MODE)?;

    let (seeded, org_created) = store::transaction(&ctx.paths, |store| -> Result<_> {
        let seeded: Vec<&str> = constants::MANAGED_CREDENTIAL_TYPES
            .iter()
            .filter(|(kind, name)| store.ensure_credential_type(kind, name))
            .map(|(kind, _)| *kind)
            .collect();
        let org_created = match args.organization.as_deref() {
            Some(org) => store.ensure_organization(org),
            None => false,
        };
        Ok((seeded, org_created))
    })?;

    if !seeded.is_empty() {
        ctx.audit(AuditRecord::new("init", &paths.root.display().to_string()).fields(
            seeded.iter().map(|k| k.to_string()).collect(),
        ));
    }

    println!("store initialized at {}", paths.root.display());
    if seeded.is_empty() {
        println!("credential types: already present");
    } else {
        println!("credential types: seeded {}", seeded.join(", "));
    }
    if let Some(org) = args.organization.as_deref().filter(|_| org_created) {
        ctx.audit(AuditRecord::new("organization.create", org));
        println!("organization: created '{}'", org);
    }
    Ok(())
}
