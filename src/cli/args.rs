use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a project's Terraform state and resolve its Cloudflare resources
    #[command(visible_alias = "c")]
    Compare(CompareArgs),
}

#[derive(clap::Args, Debug)]
pub struct CompareArgs {
    /// Terraform project directory
    #[arg(short, long)]
    pub path: PathBuf,

    #[arg(short = 'e', long, env = "CLOUDFLARE_EMAIL")]
    pub cloudflare_email: String,

    #[arg(short = 'k', long, env = "CLOUDFLARE_API_KEY", hide_env_values = true)]
    pub cloudflare_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use serial_test::serial;

    fn compare_args(cli: Cli) -> CompareArgs {
        match cli.command {
            Command::Compare(args) => args,
        }
    }

    #[test]
    #[serial]
    fn test_compare_args_from_flags() {
        let cli = Cli::parse_from([
            "cf-tf-diff",
            "compare",
            "--path=infra",
            "--cloudflare-email=ops@example.com",
            "--cloudflare-key=secret",
        ]);

        let args = compare_args(cli);
        assert_eq!(args.path, PathBuf::from("infra"));
        assert_eq!(args.cloudflare_email, "ops@example.com");
        assert_eq!(args.cloudflare_key, "secret");
    }

    #[test]
    #[serial]
    fn test_compare_alias_and_short_flags() {
        let cli = Cli::parse_from([
            "cf-tf-diff",
            "c",
            "-p",
            "infra",
            "-e",
            "ops@example.com",
            "-k",
            "secret",
        ]);

        let args = compare_args(cli);
        assert_eq!(args.path, PathBuf::from("infra"));
        assert_eq!(args.cloudflare_key, "secret");
    }

    #[test]
    #[serial]
    fn test_credentials_from_env_var_fallback() {
        let email_backup = std::env::var("CLOUDFLARE_EMAIL").ok();
        let key_backup = std::env::var("CLOUDFLARE_API_KEY").ok();

        unsafe {
            std::env::set_var("CLOUDFLARE_EMAIL", "env@example.com");
            std::env::set_var("CLOUDFLARE_API_KEY", "env_key");
        }

        let cli = Cli::parse_from(["cf-tf-diff", "compare", "--path", "infra"]);

        unsafe {
            match email_backup {
                Some(email) => std::env::set_var("CLOUDFLARE_EMAIL", email),
                None => std::env::remove_var("CLOUDFLARE_EMAIL"),
            }
            match key_backup {
                Some(key) => std::env::set_var("CLOUDFLARE_API_KEY", key),
                None => std::env::remove_var("CLOUDFLARE_API_KEY"),
            }
        }

        let args = compare_args(cli);
        assert_eq!(args.path, PathBuf::from("infra"));
        assert_eq!(args.cloudflare_email, "env@example.com");
        assert_eq!(args.cloudflare_key, "env_key");
    }

    #[test]
    #[serial]
    fn test_cli_flag_takes_precedence_over_env() {
        let key_backup = std::env::var("CLOUDFLARE_API_KEY").ok();

        unsafe {
            std::env::set_var("CLOUDFLARE_API_KEY", "env_key");
        }

        let cli = Cli::parse_from([
            "cf-tf-diff",
            "compare",
            "-p",
            "infra",
            "--cloudflare-email=ops@example.com",
            "--cloudflare-key=cli_key",
        ]);

        unsafe {
            match key_backup {
                Some(key) => std::env::set_var("CLOUDFLARE_API_KEY", key),
                None => std::env::remove_var("CLOUDFLARE_API_KEY"),
            }
        }

        assert_eq!(compare_args(cli).cloudflare_key, "cli_key");
    }

    #[test]
    #[serial]
    fn test_missing_credentials_rejected() {
        let email_backup = std::env::var("CLOUDFLARE_EMAIL").ok();
        let key_backup = std::env::var("CLOUDFLARE_API_KEY").ok();
        unsafe {
            std::env::remove_var("CLOUDFLARE_EMAIL");
            std::env::remove_var("CLOUDFLARE_API_KEY");
        }

        let result = Cli::try_parse_from(["cf-tf-diff", "compare", "--path", "infra"]);

        unsafe {
            if let Some(email) = email_backup {
                std::env::set_var("CLOUDFLARE_EMAIL", email);
            }
            if let Some(key) = key_backup {
                std::env::set_var("CLOUDFLARE_API_KEY", key);
            }
        }

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_missing_path_rejected() {
        let result = Cli::try_parse_from([
            "cf-tf-diff",
            "compare",
            "--cloudflare-email=ops@example.com",
            "--cloudflare-key=secret",
        ]);

        match result {
            Err(err) => assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument),
            Ok(cli) => panic!("expected missing --path, got {:?}", cli),
        }
    }
}
