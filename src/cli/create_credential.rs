use crate::cli::organization::trim_organization_name;
use crate::cli::CliContext;
use crate::core::audit_log::AuditRecord;
use crate::core::schema::CredentialOptions;
use crate::core::store;
use crate::core::upsert::{upsert_credential, UpsertOutcome};
use anyhow::Result;
use clap::{ArgAction, Args};

fn parse_non_blank(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        return Err("value cannot be empty".into());
    }
    Ok(s.to_string())
}

/// Accepts the usual truthy/falsy spellings (y/yes/t/true/on/1, n/no/f/false/off/0).
pub fn parse_bool_like(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Ok(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Ok(false),
        _ => Err(format!("invalid truth value '{}'", s)),
    }
}

#[derive(Args, Debug)]
pub struct CreateCredentialArgs {
    /// Credential name
    #[arg(long, value_parser = parse_non_blank)]
    pub name: String,

    /// Credential description
    #[arg(long)]
    pub description: Option<String>,

    /// Organization name to associate the credential with
    #[arg(long, value_parser = trim_organization_name)]
    pub organization: Option<String>,

    /// Kind of credential type to create (galaxy|registry)
    #[arg(long, value_parser = parse_non_blank)]
    pub credential_type: String,

    /// Server URL
    #[arg(long)]
    pub server_url: Option<String>,

    /// Auth server URL
    #[arg(long)]
    pub auth_server_url: Option<String>,

    /// Username for authentication
    #[arg(long)]
    pub username: Option<String>,

    /// Password or token for authentication
    #[arg(long)]
    pub password: Option<String>,

    /// Verify SSL when authenticating with the container registry
    #[arg(
        long,
        value_name = "BOOL",
        default_value = "true",
        value_parser = parse_bool_like,
        action = ArgAction::Set
    )]
    pub verify_ssl: bool,
}

impl From<CreateCredentialArgs> for CredentialOptions {
    fn from(args: CreateCredentialArgs) -> Self {
        CredentialOptions {
            name: args.name,
            credential_type: args.credential_type,
            description: args.description,
            organization: args.organization,
            server_url: args.server_url,
            auth_server_url: args.auth_server_url,
            username: args.username,
            password: args.password,
            verify_ssl: args.verify_ssl,
        }
    }
}

pub fn run(ctx: &CliContext, args: CreateCredentialArgs) -> Result<()> {
    let opts = CredentialOptions::from(args);
    let outcome = store::transaction(&ctx.paths, |store| upsert_credential(store, &opts))?;

    match &outcome {
        UpsertOutcome::Created(cred) => ctx.audit(
            AuditRecord::new("credential.create", &cred.name)
                .kind(&opts.credential_type)
                .fields(cred.inputs.keys().cloned().collect()),
        ),
        UpsertOutcome::Updated {
            credential,
            changed_keys,
        } => ctx.audit(
            AuditRecord::new("credential.update", &credential.name)
                .kind(&opts.credential_type)
                .fields(changed_keys.clone()),
        ),
        UpsertOutcome::Unchanged(_) => {}
    }

    for line in report_lines(&opts.name, &outcome) {
        println!("{}", line);
    }
    Ok(())
}

fn report_lines(name: &str, outcome: &UpsertOutcome) -> Vec<String> {
    let mut lines = Vec::new();
    match outcome {
        UpsertOutcome::Created(_) => lines.push(format!("Created '{}' credential.", name)),
        UpsertOutcome::Updated { .. } => lines.push(format!("Updated '{}' credential.", name)),
        UpsertOutcome::Unchanged(_) => {}
    }
    let changed = if outcome.changed() { "True" } else { "False" };
    lines.push(format!("(changed: {})", changed));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::TextOption;
    use crate::models::credential::Credential;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct Harness {
        #[command(flatten)]
        args: CreateCredentialArgs,
    }

    fn parse(argv: &[&str]) -> Result<CreateCredentialArgs, clap::Error> {
        Harness::try_parse_from(std::iter::once("credadm").chain(argv.iter().copied())).map(|h| h.args)
    }

    #[test]
    fn test_parse_bool_like() {
        for s in ["y", "YES", "t", "True", "on", "1"] {
            assert_eq!(parse_bool_like(s), Ok(true), "{}", s);
        }
        for s in ["n", "no", "F", "false", "OFF", "0"] {
            assert_eq!(parse_bool_like(s), Ok(false), "{}", s);
        }
        assert!(parse_bool_like("maybe").is_err());
    }

    #[test]
    fn test_verify_ssl_defaults_to_true() {
        let args = parse(&["--name", "foo", "--credential-type", "registry"]).unwrap();
        assert!(args.verify_ssl);
        assert!(args.server_url.is_none());
    }

    #[test]
    fn test_verify_ssl_accepts_false() {
        let args = parse(&["--name", "foo", "--credential-type", "registry", "--verify-ssl", "no"]).unwrap();
        assert!(!args.verify_ssl);
    }

    #[test]
    fn test_name_and_type_are_required() {
        assert!(parse(&["--credential-type", "registry"]).is_err());
        assert!(parse(&["--name", "foo"]).is_err());
        assert!(parse(&["--name", " ", "--credential-type", "registry"]).is_err());
    }

    #[test]
    fn test_args_map_to_options() {
        let args = parse(&[
            "--name",
            "hub",
            "--credential-type",
            "galaxy",
            "--organization",
            "Default",
            "--server-url",
            "https://galaxy.example",
            "--auth-server-url",
            "https://sso.example",
            "--password",
            "t0ken",
        ])
        .unwrap();
        let opts = CredentialOptions::from(args);
        assert_eq!(opts.name, "hub");
        assert_eq!(opts.organization.as_deref(), Some("Default"));
        assert_eq!(opts.auth_server_url.as_deref(), Some("https://sso.example"));
        assert_eq!(opts.password.as_deref(), Some("t0ken"));
    }

    #[test]
    fn test_organization_is_trimmed() {
        let args = parse(&["--name", "hub", "--credential-type", "galaxy", "--organization", "  Eng \t"]).unwrap();
        assert_eq!(args.organization.as_deref(), Some("Eng"));

        let blank = parse(&["--name", "hub", "--credential-type", "galaxy", "--organization", "   "]).unwrap();
        let opts = CredentialOptions::from(blank);
        assert_eq!(opts.text(TextOption::Organization), None);
    }

    #[test]
    fn test_report_lines() {
        let cred = Credential::default();
        assert_eq!(
            report_lines("foo", &UpsertOutcome::Created(cred.clone())),
            ["Created 'foo' credential.", "(changed: True)"]
        );
        assert_eq!(
            report_lines(
                "foo",
                &UpsertOutcome::Updated {
                    credential: cred.clone(),
                    changed_keys: vec!["username".into()],
                }
            ),
            ["Updated 'foo' credential.", "(changed: True)"]
        );
        assert_eq!(report_lines("foo", &UpsertOutcome::Unchanged(cred)), ["(changed: False)"]);
    }
}
