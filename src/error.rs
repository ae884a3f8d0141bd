use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// A malformed escaped module path or version segment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// `!` followed by something other than a lower-case ASCII letter, or at the end of input
    #[error("invalid escape sequence in {input:?}")]
    InvalidEscape { input: String },

    /// Upper-case letters must always be escaped
    #[error("unescaped upper-case letter in {input:?}")]
    UnescapedUpper { input: String },

    /// Escaped segments are plain ASCII
    #[error("non-ASCII character in {input:?}")]
    NonAscii { input: String },

    /// `!` is reserved for escapes and can not appear in a decoded identifier
    #[error("{input:?} can not be escaped")]
    Unencodable { input: String },

    /// The decoded module path is not a usable path
    #[error("malformed module path {path:?}: {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// The decoded version is not a usable version token
    #[error("malformed version {version:?}: {reason}")]
    InvalidVersion {
        version: String,
        reason: &'static str,
    },
}

/// Startup configuration errors. These are fatal.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A replace rule pattern failed to compile
    #[error("replace rule error: invalid pattern {pattern:?}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Neither an explicit cache dir nor `GOPATH` is available
    #[error("can not find $GOPATH")]
    MissingGopath,

    /// The config file could not be read
    #[error("could not read config file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this gateway
    #[error("invalid config file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Failures of the external resolution engine.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The engine could not be started at all
    #[error("could not run {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The engine ran and exited unsuccessfully
    #[error("download {target} failed ({status})")]
    Failed {
        target: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
}

/// Failures while mirroring a module tree or rewriting an archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("I/O error on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("zip error on {path}")]
    Zip {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("could not walk {path}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The hash summary format can not represent this entry name
    #[error("archive entry names with newlines are not supported: {name:?}")]
    NewlineInName { name: String },
}

impl ArchiveError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ArchiveError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn zip(path: impl Into<PathBuf>, source: zip::result::ZipError) -> Self {
        ArchiveError::Zip {
            path: path.into(),
            source,
        }
    }
}

/// Everything that can end a single request with a server error.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The request path does not have the module proxy shape
    #[error("bad module path:{path}")]
    Protocol { path: String },

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

impl GatewayError {
    /// HTTP status used when this error is written to a response.
    pub fn status_code(&self) -> u16 {
        500
    }

    /// Short category name for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            GatewayError::Decode(_) => "decode",
            GatewayError::Protocol { .. } => "protocol",
            GatewayError::Resolve(_) => "resolve",
            GatewayError::Archive(_) => "archive",
        }
    }
}
