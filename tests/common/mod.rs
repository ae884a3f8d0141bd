#![allow(dead_code)]

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use modgate::{GatewayConfig, ResolutionOutcome, ResolveError, Resolver, Router, RuleManager};
use tempfile::{NamedTempFile, TempDir};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Stands in for `go get`: fills the cache the way the toolchain does and
/// reports a `downloading` line.
pub struct FakeGo {
    pub root: PathBuf,
    /// Version to report instead of the requested one.
    pub settle_on: Option<String>,
    pub fail: bool,
    pub delay: Duration,
    pub calls: AtomicUsize,
}

impl FakeGo {
    pub fn new(root: &Path) -> Self {
        FakeGo {
            root: root.to_path_buf(),
            settle_on: None,
            fail: false,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Stages outside the module tree, then renames into place.
    fn publish(&self, path: &Path, contents: &[u8]) {
        let mut staged = NamedTempFile::new_in(&self.root).unwrap();
        staged.write_all(contents).unwrap();
        staged.persist(path).unwrap();
    }
}

impl Resolver for FakeGo {
    fn resolve(&self, module: &str, version: &str) -> Result<ResolutionOutcome, ResolveError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
        if self.fail {
            return Err(ResolveError::Spawn {
                program: "go".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no go here"),
            });
        }
        let version = self.settle_on.clone().unwrap_or_else(|| version.to_string());
        let dir = self.root.join(module).join("@v");
        fs::create_dir_all(&dir).unwrap();
        let info = format!(r#"{{"Version":"{version}","Time":"2024-01-02T03:04:05Z"}}"#);
        self.publish(&dir.join(format!("{version}.info")), info.as_bytes());
        let manifest = format!("module {module}\n");
        self.publish(&dir.join(format!("{version}.mod")), manifest.as_bytes());
        let go_mod = format!("{module}@{version}/go.mod");
        let lib = format!("{module}@{version}/lib.go");
        let staged = NamedTempFile::new_in(&self.root).unwrap();
        write_zip(
            staged.path(),
            &[(go_mod.as_str(), manifest.as_str()), (lib.as_str(), "package lib\n")],
        );
        staged.persist(dir.join(format!("{version}.zip"))).unwrap();
        self.publish(&dir.join(format!("{version}.ziphash")), b"h1:canonical");
        Ok(ResolutionOutcome {
            downloads: vec![(module.to_string(), version)],
        })
    }
}

pub fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = ZipWriter::new(File::create(path).unwrap());
    for (name, contents) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

pub fn config(cache_dir: &Path, rules: &str) -> Arc<GatewayConfig> {
    Arc::new(GatewayConfig {
        listen: "127.0.0.1:0".to_string(),
        cache_dir: cache_dir.to_path_buf(),
        rules: RuleManager::build(rules).unwrap(),
        go_bin: "go".to_string(),
    })
}

pub fn setup(rules: &str, go: impl FnOnce(FakeGo) -> FakeGo) -> (TempDir, Arc<FakeGo>, Arc<Router>) {
    let dir = TempDir::new().unwrap();
    let go = Arc::new(go(FakeGo::new(dir.path())));
    let router = Arc::new(Router::new(config(dir.path(), rules), go.clone()));
    (dir, go, router)
}
