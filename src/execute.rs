use std::sync::Arc;
use anyhow::{Context, Result};
use modgate::{GoCommand, Router, Settings};
use tracing::info;
use crate::cli::CLI;

pub fn execute(cli: CLI) -> Result<()> {
    let file_settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let gopath = std::env::var_os("GOPATH");
    let config = file_settings
        .merge(cli.settings())
        .build(gopath.as_deref())
        .context("invalid configuration")?;

    std::fs::create_dir_all(&config.cache_dir)
        .with_context(|| format!("Could not create cache dir {:?}", config.cache_dir))?;
    info!(go = %config.go_bin, "using resolution engine");

    let resolver = Arc::new(GoCommand::new(config.go_bin.clone()));
    let router = Arc::new(Router::new(Arc::new(config), resolver));
    modgate::server::serve(router)
}
