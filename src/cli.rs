use std::path::PathBuf;
use clap::Parser;
use modgate::{Settings, RULES_ENV};

#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// Service listen address [default: 0.0.0.0:8081]
    #[clap(long)]
    pub listen: Option<String>,
    /// Replace rules: `<pattern> <replacement>` pairs separated by `,`
    #[clap(long, env = RULES_ENV)]
    pub rules: Option<String>,
    /// Module download cache. Defaults to `$GOPATH/pkg/mod/cache/download`
    #[clap(long)]
    pub cache_dir: Option<PathBuf>,
    /// The `go` executable used to fetch missing modules [default: go]
    #[clap(long)]
    pub go_bin: Option<String>,
    /// Read settings from a TOML file. Command line and environment take precedence
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Log at debug level
    #[clap(short, long)]
    pub verbose: bool,
}

impl CLI {
    pub fn settings(&self) -> Settings {
        Settings {
            listen: self.listen.clone(),
            rules: self.rules.clone(),
            cache_dir: self.cache_dir.clone(),
            go_bin: self.go_bin.clone(),
        }
    }
}
