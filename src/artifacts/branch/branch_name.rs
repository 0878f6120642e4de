use crate::artifacts::branch::{INVALID_BRANCH_NAME_REGEX, PROTECTED_BRANCHES};
use crate::artifacts::core::error::BruvError;
use anyhow::Context;

pub const REF_PREFIX: &str = "refs/heads/";

/// The target of HEAD, e.g. `refs/heads/main`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct SymRefName(String);

impl SymRefName {
    /// Parse the contents of a HEAD file (`ref: refs/heads/<name>`)
    pub fn try_parse_head(content: &str) -> anyhow::Result<Self> {
        let target = content
            .trim_end()
            .strip_prefix("ref: ")
            .ok_or_else(|| {
                BruvError::InvalidRef(format!("HEAD is not symbolic: '{}'", content.trim_end()))
            })?;

        if !target.starts_with(REF_PREFIX) {
            return Err(BruvError::InvalidRef(format!(
                "HEAD points outside {REF_PREFIX}: '{target}'"
            ))
            .into());
        }

        Ok(SymRefName(target.to_string()))
    }

    pub fn as_ref_path(&self) -> &str {
        &self.0
    }

    pub fn to_head_line(&self) -> String {
        format!("ref: {}\n", self.0)
    }
}

impl From<&BranchName> for SymRefName {
    fn from(branch: &BranchName) -> Self {
        SymRefName(format!("{REF_PREFIX}{branch}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    pub fn try_parse(name: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(BruvError::InvalidRef("branch name cannot be empty".into()).into());
        }

        let re = regex::Regex::new(INVALID_BRANCH_NAME_REGEX)
            .with_context(|| format!("invalid branch name regex: {INVALID_BRANCH_NAME_REGEX}"))?;

        if re.is_match(&name) {
            Err(BruvError::InvalidRef(format!("'{name}' is not a valid branch name")).into())
        } else {
            Ok(Self(name))
        }
    }

    pub fn try_parse_sym_ref_name(sym_ref_name: &SymRefName) -> anyhow::Result<Self> {
        let name = sym_ref_name
            .0
            .strip_prefix(REF_PREFIX)
            .ok_or_else(|| {
                BruvError::InvalidRef(format!("'{}' is not a branch ref", sym_ref_name.0))
            })?;

        Self::try_parse(name)
    }

    /// Protected branches never accept direct pushes
    pub fn is_protected(&self) -> bool {
        PROTECTED_BRANCHES.contains(&self.0.as_str())
    }

    pub fn to_ref_path(&self) -> String {
        format!("{REF_PREFIX}{}", self.0)
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(".hidden")]
    #[case("a..b")]
    #[case("topic.lock")]
    #[case("with space")]
    #[case("star*")]
    #[case("trailing/")]
    #[case("")]
    fn malformed_branch_names_are_invalid_refs(#[case] name: &str) {
        let error = BranchName::try_parse(name).unwrap_err();

        assert!(matches!(
            BruvError::classify(&error),
            Some(BruvError::InvalidRef(_))
        ));
    }

    #[rstest]
    #[case("main", true)]
    #[case("master", true)]
    #[case("feature/login", false)]
    fn protection_follows_branch_name(#[case] name: &str, #[case] protected: bool) {
        pretty_assertions::assert_eq!(
            BranchName::try_parse(name).unwrap().is_protected(),
            protected
        );
    }

    #[test]
    fn head_must_be_symbolic() {
        let head = SymRefName::try_parse_head("ref: refs/heads/main\n").unwrap();
        pretty_assertions::assert_eq!(
            BranchName::try_parse_sym_ref_name(&head).unwrap().as_ref(),
            "main"
        );

        assert!(SymRefName::try_parse_head("32f95c0d1244a78b2be1bab8de17906fabb2c4a8\n").is_err());
        assert!(SymRefName::try_parse_head("ref: refs/tags/v1\n").is_err());
    }
}
