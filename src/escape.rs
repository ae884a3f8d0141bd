use crate::error::DecodeError;

/// Decodes an escaped module path as it appears in a proxy URL.
///
/// # Errors
///
/// Returns a [`DecodeError`] for a dangling `!`, a `!` not followed by a
/// lower-case letter, an unescaped upper-case letter, or a decoded path that
/// is not a well-formed module path.
///
/// # Example
///
/// ```
/// use modgate::decode_path;
///
/// assert_eq!(decode_path("github.com/!azure/sdk").unwrap(), "github.com/Azure/sdk");
/// assert!(decode_path("github.com/!").is_err());
/// ```
pub fn decode_path(escaped: &str) -> Result<String, DecodeError> {
    let path = unescape(escaped)?;
    check_path(&path)?;
    Ok(path)
}

/// Decodes an escaped version token. Same scheme as [`decode_path`].
pub fn decode_version(escaped: &str) -> Result<String, DecodeError> {
    let version = unescape(escaped)?;
    if version.is_empty() {
        return Err(DecodeError::InvalidVersion { version, reason: "empty version" });
    }
    if version.contains('/') {
        return Err(DecodeError::InvalidVersion { version, reason: "contains '/'" });
    }
    Ok(version)
}

/// Escapes a module path for use on disk or in a URL: every upper-case
/// letter becomes `!` followed by its lower-case form.
pub fn encode_path(path: &str) -> Result<String, DecodeError> {
    check_path(path)?;
    escape(path)
}

/// Escapes a version token for use on disk or in a URL.
pub fn encode_version(version: &str) -> Result<String, DecodeError> {
    escape(version)
}

fn escape(s: &str) -> Result<String, DecodeError> {
    if s.chars().any(|c| c == '!' || !c.is_ascii()) {
        return Err(DecodeError::Unencodable { input: s.to_string() });
    }
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii_uppercase() {
            out.push('!');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    Ok(out)
}

fn unescape(escaped: &str) -> Result<String, DecodeError> {
    let mut out = String::with_capacity(escaped.len());
    let mut bang = false;
    for c in escaped.chars() {
        if !c.is_ascii() {
            return Err(DecodeError::NonAscii { input: escaped.to_string() });
        }
        if bang {
            bang = false;
            if !c.is_ascii_lowercase() {
                return Err(DecodeError::InvalidEscape { input: escaped.to_string() });
            }
            out.push(c.to_ascii_uppercase());
            continue;
        }
        if c == '!' {
            bang = true;
        } else if c.is_ascii_uppercase() {
            return Err(DecodeError::UnescapedUpper { input: escaped.to_string() });
        } else {
            out.push(c);
        }
    }
    if bang {
        return Err(DecodeError::InvalidEscape { input: escaped.to_string() });
    }
    Ok(out)
}

fn check_path(path: &str) -> Result<(), DecodeError> {
    let invalid = |reason| DecodeError::InvalidPath { path: path.to_string(), reason };
    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(invalid("leading or trailing slash"));
    }
    for elem in path.split('/') {
        match elem {
            "" => return Err(invalid("double slash")),
            "." | ".." => return Err(invalid("relative path element")),
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_path_plain() {
        assert_eq!(decode_path("golang.org/x/text").unwrap(), "golang.org/x/text");
    }

    #[test]
    fn test_decode_path_upper() {
        assert_eq!(
            decode_path("github.com/!burnt!sushi/toml").unwrap(),
            "github.com/BurntSushi/toml"
        );
    }

    #[test]
    fn test_decode_rejects_dangling_bang() {
        assert!(matches!(
            decode_path("github.com/foo!"),
            Err(DecodeError::InvalidEscape { .. })
        ));
        assert!(matches!(decode_version("v1.0.0!"), Err(DecodeError::InvalidEscape { .. })));
    }

    #[test]
    fn test_decode_rejects_bang_before_non_lowercase() {
        assert!(decode_path("github.com/!Foo").is_err());
        assert!(decode_path("github.com/!1foo").is_err());
        assert!(decode_path("github.com/!!foo").is_err());
    }

    #[test]
    fn test_decode_rejects_unescaped_upper() {
        assert!(matches!(
            decode_path("github.com/Foo"),
            Err(DecodeError::UnescapedUpper { .. })
        ));
    }

    #[test]
    fn test_decode_rejects_bad_paths() {
        assert!(decode_path("").is_err());
        assert!(decode_path("a//b").is_err());
        assert!(decode_path("a/../b").is_err());
        assert!(decode_path("/a/b").is_err());
    }

    #[test]
    fn test_decode_version() {
        assert_eq!(decode_version("v1.2.3").unwrap(), "v1.2.3");
        assert_eq!(decode_version("v0.0.0-2019!r!c1").unwrap(), "v0.0.0-2019RC1");
        assert!(decode_version("").is_err());
        assert!(decode_version("v1/2").is_err());
    }

    #[test]
    fn test_round_trip() {
        let inputs = [
            "github.com/Azure/azure-sdk-for-go",
            "golang.org/x/net",
            "example.com/ALLCAPS/mixedCase",
        ];
        for input in inputs {
            let escaped = encode_path(input).unwrap();
            assert!(!escaped.chars().any(|c| c.is_ascii_uppercase()));
            assert_eq!(decode_path(&escaped).unwrap(), input);
        }
        let version = "v1.0.0-RC.1";
        assert_eq!(decode_version(&encode_version(version).unwrap()).unwrap(), version);
    }

    #[test]
    fn test_encode_rejects_bang() {
        assert!(encode_path("example.com/a!b").is_err());
    }
}
