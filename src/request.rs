use crate::error::GatewayError;
use crate::escape::{decode_path, decode_version};

const VERSION_SEP: &str = "/@v/";

/// Kind of artifact a proxy request asks for, by path suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Info,
    Mod,
    Zip,
    ZipHash,
    VersionList,
}

impl ArtifactKind {
    pub fn from_path(path: &str) -> Option<ArtifactKind> {
        if path.ends_with("/@v/list") {
            Some(ArtifactKind::VersionList)
        } else if path.ends_with(".info") {
            Some(ArtifactKind::Info)
        } else if path.ends_with(".mod") {
            Some(ArtifactKind::Mod)
        } else if path.ends_with(".zip") {
            Some(ArtifactKind::Zip)
        } else if path.ends_with(".ziphash") {
            Some(ArtifactKind::ZipHash)
        } else {
            None
        }
    }

    /// The file suffix following the version, empty for version lists.
    pub fn suffix(self) -> &'static str {
        match self {
            ArtifactKind::Info => ".info",
            ArtifactKind::Mod => ".mod",
            ArtifactKind::Zip => ".zip",
            ArtifactKind::ZipHash => ".ziphash",
            ArtifactKind::VersionList => "",
        }
    }

    /// Whether a cache miss for this kind triggers a resolution.
    pub fn resolves_on_miss(self) -> bool {
        matches!(self, ArtifactKind::Info | ArtifactKind::Mod)
    }
}

/// A `/<module>/@v/<version><suffix>` request, split and decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRequest {
    /// Everything before `/@v/`, still escaped, including the leading `/`.
    pub escaped_prefix: String,
    pub module: String,
    pub version: String,
    pub kind: ArtifactKind,
}

impl ModuleRequest {
    /// Splits a request path around its single `/@v/` separator and decodes both halves.
    ///
    /// # Errors
    /// [`GatewayError::Protocol`] unless there is exactly one separator,
    /// [`GatewayError::Decode`] if either half is badly escaped.
    pub fn parse(path: &str, kind: ArtifactKind) -> Result<ModuleRequest, GatewayError> {
        let parts: Vec<&str> = path.split(VERSION_SEP).collect();
        let [prefix, rest] = parts.as_slice() else {
            return Err(GatewayError::Protocol { path: path.to_string() });
        };
        let version = rest.strip_suffix(kind.suffix()).unwrap_or(*rest);
        let version = decode_version(version)?;
        let module = decode_path(prefix.trim_start_matches('/'))?;
        Ok(ModuleRequest {
            escaped_prefix: prefix.to_string(),
            module,
            version,
            kind,
        })
    }
}
