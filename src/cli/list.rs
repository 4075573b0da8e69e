use crate::cli::CliContext;
use crate::constants;
use crate::core::schema::is_secret_key;
use crate::core::store;
use crate::models::credential::Credential;
use crate::models::store::StoreFile;
use anyhow::{bail, Context, Result};
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Attribute, Cell, Table};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show credentials of this kind
    #[arg(long, value_name = "KIND")]
    pub credential_type: Option<String>,

    /// Output format: table|json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Debug, Serialize, PartialEq)]
struct ListItem {
    name: String,
    kind: String,
    organization: Option<String>,
    description: Option<String>,
    inputs: BTreeMap<String, String>,
}

fn list_item(store: &StoreFile, cred: &Credential) -> ListItem {
    let kind = store
        .credential_type(cred.credential_type)
        .map(|t| t.kind.clone())
        .unwrap_or_else(|| format!("#{}", cred.credential_type));
    let inputs = cred
        .inputs
        .iter()
        .map(|(key, value)| {
            let shown = if is_secret_key(&kind, key) && !value.is_empty() {
                constants::MASKED_VALUE.to_string()
            } else {
                value.to_string()
            };
            (key.clone(), shown)
        })
        .collect();
    ListItem {
        name: cred.name.clone(),
        organization: cred
            .organization
            .and_then(|id| store.organization(id))
            .map(|o| o.name.clone()),
        description: cred.description.clone(),
        kind,
        inputs,
    }
}

fn collect_items(store: &StoreFile, kind: Option<&str>) -> Vec<ListItem> {
    let mut items: Vec<ListItem> = store
        .credentials
        .iter()
        .map(|c| list_item(store, c))
        .filter(|item| kind.map_or(true, |k| item.kind == k))
        .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.kind.cmp(&b.kind)));
    items
}

pub fn run(ctx: &CliContext, args: ListArgs) -> Result<()> {
    if args.format != "table" && args.format != "json" {
        bail!("invalid format: {} (use table|json)", args.format);
    }

    let snapshot = store::snapshot(&ctx.paths)?;
    let items = collect_items(&snapshot, args.credential_type.as_deref());

    if args.format == "json" {
        let json = serde_json::to_string_pretty(&items).context("serialize list")?;
        println!("{}", json);
        return Ok(());
    }

    if items.is_empty() {
        println!("No credentials found");
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        Cell::new("Name").add_attribute(Attribute::Bold),
        Cell::new("Type").add_attribute(Attribute::Bold),
        Cell::new("Organization").add_attribute(Attribute::Bold),
        Cell::new("Description").add_attribute(Attribute::Bold),
        Cell::new("Inputs").add_attribute(Attribute::Bold),
    ]);

    for item in &items {
        let inputs = item
            .inputs
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("\n");
        table.add_row(vec![
            item.name.clone(),
            item.kind.clone(),
            item.organization.clone().unwrap_or_else(|| "-".to_string()),
            item.description.clone().unwrap_or_else(|| "-".to_string()),
            inputs,
        ]);
    }

    println!("{}", table);
    Ok(())
}
