use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, info};
use crate::archive::mirror_module;
use crate::cache::ModuleCache;
use crate::config::GatewayConfig;
use crate::dirhash::{ArchiveHasher, Hash1};
use crate::error::GatewayError;
use crate::escape::encode_version;
use crate::inflight::InFlight;
use crate::request::{ArtifactKind, ModuleRequest};
use crate::resolve::Resolver;

/// An incoming request, reduced to what routing needs.
#[derive(Debug, Clone, Copy)]
pub struct ProxyRequest<'a> {
    /// URL path without the query string.
    pub path: &'a str,
    /// Host the client addressed, used for redirects.
    pub host: &'a str,
    /// Whether the client connection is TLS.
    pub secure: bool,
}

/// What the front end should answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Stream this file from the cache.
    Serve(PathBuf),
    NotFound,
    /// `200` with an empty body.
    EmptyList,
    /// `302` to this absolute URL.
    Redirect(String),
}

/// Decides, per request, between serving the cache and filling it first.
pub struct Router {
    config: Arc<GatewayConfig>,
    cache: ModuleCache,
    resolver: Arc<dyn Resolver>,
    hasher: Box<dyn ArchiveHasher>,
    inflight: InFlight,
}

impl Router {
    pub fn new(config: Arc<GatewayConfig>, resolver: Arc<dyn Resolver>) -> Self {
        Self::with_hasher(config, resolver, Box::new(Hash1))
    }

    pub fn with_hasher(
        config: Arc<GatewayConfig>,
        resolver: Arc<dyn Resolver>,
        hasher: Box<dyn ArchiveHasher>,
    ) -> Self {
        let cache = ModuleCache::new(&config.cache_dir);
        Self {
            config,
            cache,
            resolver,
            hasher,
            inflight: InFlight::new(),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn cache(&self) -> &ModuleCache {
        &self.cache
    }

    /// Routes one request.
    ///
    /// Cache hits are served as-is. A missed `.info` or `.mod` resolves the
    /// module (mirroring it when a rule renamed it) and may redirect to the
    /// version the engine actually settled on. A missed `/@v/list` is an
    /// empty list. Everything else falls through to the cache.
    pub fn route(&self, req: &ProxyRequest<'_>) -> Result<Route, GatewayError> {
        if self.cache.contains(req.path) {
            debug!(path = req.path, "cache hit");
            return Ok(self.serve(req.path));
        }
        match ArtifactKind::from_path(req.path) {
            Some(kind) if kind.resolves_on_miss() => {
                let module_req = ModuleRequest::parse(req.path, kind)?;
                if let Some(location) = self.fill(req, &module_req)? {
                    info!(path = req.path, %location, "redirecting to resolved version");
                    return Ok(Route::Redirect(location));
                }
            }
            Some(ArtifactKind::VersionList) => return Ok(Route::EmptyList),
            _ => {}
        }
        Ok(self.serve(req.path))
    }

    fn serve(&self, path: &str) -> Route {
        match self.cache.file(path) {
            Some(file) => Route::Serve(file),
            None => Route::NotFound,
        }
    }

    /// Resolves and, if needed, mirrors a module. Returns a redirect location
    /// when the engine resolved a different version.
    fn fill(
        &self,
        req: &ProxyRequest<'_>,
        module_req: &ModuleRequest,
    ) -> Result<Option<String>, GatewayError> {
        let canonical = self.config.rules.replace(&module_req.module);
        let key = format!("{}@{}", canonical, module_req.version);
        self.inflight.run(&key, || -> Result<Option<String>, GatewayError> {
            // filled by a concurrent request while we waited
            if self.cache.contains(req.path) {
                return Ok(None);
            }
            debug!(module = %module_req.module, %canonical, version = %module_req.version, "cache miss");
            let outcome = self.resolver.resolve(&canonical, &module_req.version)?;

            if canonical != module_req.module {
                self.mirror(&canonical, &module_req.module)?;
            }

            match outcome.drift(&canonical, &module_req.version) {
                Some(resolved) => Ok(Some(redirect_location(req, module_req, resolved)?)),
                None => Ok(None),
            }
        })
    }

    fn mirror(&self, canonical: &str, private: &str) -> Result<(), GatewayError> {
        let src = self.cache.module_dir(canonical)?;
        let dst = self.cache.module_dir(private)?;
        // fills for other versions of the same module walk the same tree
        let key = format!("{private}/@v");
        self.inflight.run(&key, || {
            mirror_module(&src, &dst, canonical, private, self.hasher.as_ref())
        })
        .map_err(|e| {
            error!(canonical, private, error = %e, "copy {} to {} failed", canonical, private);
            GatewayError::from(e)
        })?;
        Ok(())
    }
}

fn redirect_location(
    req: &ProxyRequest<'_>,
    module_req: &ModuleRequest,
    resolved: &str,
) -> Result<String, GatewayError> {
    let scheme = if req.secure { "https" } else { "http" };
    Ok(format!(
        "{}://{}{}/@v/{}{}",
        scheme,
        req.host,
        module_req.escaped_prefix,
        encode_version(resolved)?,
        module_req.kind.suffix()
    ))
}
