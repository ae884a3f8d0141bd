use regex::Regex;
use crate::error::ConfigError;

/// A single `pattern replacement` pair.
///
/// The replacement may refer to capture groups of the pattern with `$1`,
/// `${name}` and so on.
#[derive(Debug, Clone)]
pub struct ReplaceRule {
    regex: Regex,
    replace: String,
}

impl ReplaceRule {
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    pub fn replacement(&self) -> &str {
        &self.replace
    }
}

/// Maps private module paths to the canonical paths handed to the resolution engine.
///
/// Rules are ordered once at construction: longer pattern sources first, and
/// among equally long sources the lexicographically greater one first. This
/// only approximates "most specific wins", it does not measure how much of
/// the input a pattern actually matches.
#[derive(Debug, Clone, Default)]
pub struct RuleManager {
    rules: Vec<ReplaceRule>,
}

impl RuleManager {
    /// Builds a manager from a rule specification such as
    /// `"example.com/(.*) git.internal/go/$1.git,corp.io/x corp.io/y"`.
    ///
    /// Entries are separated by `,`. Each entry must be exactly two fields
    /// separated by a single space; anything else is skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRule`] if a pattern is not a valid regular expression.
    ///
    /// # Example
    ///
    /// ```
    /// use modgate::RuleManager;
    ///
    /// let rules = RuleManager::build("corp.io/(.*) github.com/corp/$1").unwrap();
    /// assert_eq!(rules.replace("corp.io/tool"), "github.com/corp/tool");
    /// assert_eq!(rules.replace("golang.org/x/net"), "golang.org/x/net");
    /// ```
    pub fn build(spec: &str) -> Result<RuleManager, ConfigError> {
        let mut rules = Vec::new();
        for entry in spec.split(',') {
            let fields: Vec<&str> = entry.split(' ').collect();
            if fields.len() != 2 {
                continue;
            }
            let regex = Regex::new(fields[0]).map_err(|source| ConfigError::InvalidRule {
                pattern: fields[0].to_string(),
                source,
            })?;
            rules.push(ReplaceRule {
                regex,
                replace: fields[1].to_string(),
            });
        }
        rules.sort_by(|a, b| {
            let (a, b) = (a.pattern(), b.pattern());
            b.len().cmp(&a.len()).then_with(|| b.cmp(a))
        });
        Ok(RuleManager { rules })
    }

    /// Applies the first rule whose pattern matches anywhere in `path`.
    /// Returns `path` unchanged when no rule matches.
    pub fn replace(&self, path: &str) -> String {
        for rule in &self.rules {
            if rule.regex.is_match(path) {
                return rule.regex.replace_all(path, rule.replace.as_str()).into_owned();
            }
        }
        path.to_string()
    }

    pub fn rules(&self) -> &[ReplaceRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_one_rule() {
        let manager = RuleManager::build("mtime.com/(.*) gitlab.mtime-dev.com/go/$1.git").unwrap();
        assert_eq!(
            manager.replace("mtime.com/core/auxom"),
            "gitlab.mtime-dev.com/go/core/auxom.git"
        );
    }

    #[test]
    fn test_parse_two_rules_falls_back_to_shorter() {
        let manager = RuleManager::build(
            "mtime.com/(.*) gitlab.mtime-dev.com/go/$1.git,mtime.com/core/(.*) gitlab.mtime-dev.com/go/core/$1.git",
        )
        .unwrap();
        assert_eq!(manager.replace("mtime.com/demo"), "gitlab.mtime-dev.com/go/demo.git");
        assert_eq!(
            manager.replace("mtime.com/core/auxom"),
            "gitlab.mtime-dev.com/go/core/auxom.git"
        );
    }

    #[test]
    fn test_longer_pattern_sorted_first() {
        // 10 and 20 characters
        let manager = RuleManager::build("aaaaaaaaaa x,bbbbbbbbbbbbbbbbbbbb y").unwrap();
        let patterns: Vec<&str> = manager.rules().iter().map(|r| r.pattern()).collect();
        assert_eq!(patterns, vec!["bbbbbbbbbbbbbbbbbbbb", "aaaaaaaaaa"]);
    }

    #[test]
    fn test_equal_length_sorted_reverse_lexicographic() {
        let manager = RuleManager::build("abc/x one,abd/x two,abb/x three").unwrap();
        let patterns: Vec<&str> = manager.rules().iter().map(|r| r.pattern()).collect();
        assert_eq!(patterns, vec!["abd/x", "abc/x", "abb/x"]);
    }

    #[test]
    fn test_only_first_matching_rule_applies() {
        // both patterns match "corp.io/lib", the longer one wins and nothing is chained
        let manager = RuleManager::build("corp.io pub.io,corp.io/lib mirror.io/lib").unwrap();
        assert_eq!(manager.replace("corp.io/lib"), "mirror.io/lib");
        assert_eq!(manager.replace("corp.io/app"), "pub.io/app");
    }

    #[test]
    fn test_no_match_returns_input() {
        let manager = RuleManager::build("corp.io/(.*) pub.io/$1").unwrap();
        assert_eq!(manager.replace("golang.org/x/text"), "golang.org/x/text");
        assert_eq!(RuleManager::default().replace("a/b"), "a/b");
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let manager = RuleManager::build("only-one-field,a b c,,x  y,ok/(.*) fine/$1").unwrap();
        assert_eq!(manager.rules().len(), 1);
        assert_eq!(manager.rules()[0].replacement(), "fine/$1");
    }

    #[test]
    fn test_empty_rule_string() {
        assert!(RuleManager::build("").unwrap().is_empty());
    }

    #[test]
    fn test_invalid_pattern_is_error() {
        let err = RuleManager::build("corp.io/(.* pub.io").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRule { .. }));
    }
}
