mod cli;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use tracing_subscriber::EnvFilter;

use cf_tf_diff::terraform::module;
use cf_tf_diff::{CloudflareClient, Project, ProviderRegistry, output};
use cli::{Cli, Command, CompareArgs};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Compare(args) => compare(args).await?,
    }

    Ok(())
}

async fn compare(args: CompareArgs) -> Result<()> {
    let client = CloudflareClient::new(args.cloudflare_email, args.cloudflare_key)?;
    tracing::debug!(?client, "cloudflare client ready");

    let project = Project::new(&args.path);
    let registry = ProviderRegistry::with_defaults();
    let resources = project
        .load_resources(&registry)
        .await
        .wrap_err_with(|| format!("failed to load state for {}", args.path.display()))?;

    println!("{}", output::summary_table(&resources));

    match module::collect_resources(project.dir()) {
        Ok(declared) => {
            let root = args.path.display().to_string();
            println!("{}", output::module_tree(&root, &declared));
            tracing::info!(declared = declared.len(), "configuration walked");
        }
        Err(e) => tracing::warn!(error = %e, "could not walk terraform configuration"),
    }

    tracing::info!(count = resources.len(), "compare complete");
    Ok(())
}
