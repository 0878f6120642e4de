use crate::artifacts::branch::branch_name::{BranchName, REF_PREFIX};
use crate::artifacts::core::error::BruvError;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    UploadPack,
    ReceivePack,
    MergeRequest,
}

impl Verb {
    pub fn as_str(&self) -> &str {
        match self {
            Verb::UploadPack => "upload-pack",
            Verb::ReceivePack => "receive-pack",
            Verb::MergeRequest => "merge-request",
        }
    }
}

impl TryFrom<&str> for Verb {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> anyhow::Result<Self> {
        match value {
            "upload-pack" => Ok(Verb::UploadPack),
            "receive-pack" => Ok(Verb::ReceivePack),
            "merge-request" => Ok(Verb::MergeRequest),
            _ => Err(BruvError::Unsupported(format!("unknown command '{value}'")).into()),
        }
    }
}

/// The first line of every connection
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct CommandLine {
    pub verb: Verb,
    pub repository: String,
    pub branch: Option<BranchName>,
    pub select: Vec<PathBuf>,
}

impl CommandLine {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let mut words = line.split_whitespace();
        let verb = Verb::try_from(
            words
                .next()
                .ok_or_else(|| BruvError::Unsupported("empty command".into()))?,
        )?;
        let repository = words
            .next()
            .ok_or_else(|| {
                BruvError::NotFound(format!("{} needs a repository path", verb.as_str()))
            })?
            .to_string();

        let mut branch = None;
        let mut select = Vec::new();
        let mut selecting = false;

        while let Some(word) = words.next() {
            match word {
                "--branch" => {
                    selecting = false;
                    let name = words
                        .next()
                        .ok_or_else(|| BruvError::InvalidRef("--branch needs a name".into()))?;
                    branch = Some(BranchName::try_parse(name)?);
                }
                "--select" => selecting = true,
                path if selecting && !path.starts_with("--") => select.push(PathBuf::from(path)),
                other => {
                    return Err(BruvError::Unsupported(format!("unknown option '{other}'")).into());
                }
            }
        }

        Ok(CommandLine {
            verb,
            repository,
            branch,
            select,
        })
    }
}

impl std::fmt::Display for CommandLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.verb.as_str(), self.repository)?;
        if let Some(branch) = &self.branch {
            write!(f, " --branch {branch}")?;
        }
        if !self.select.is_empty() {
            write!(f, " --select")?;
            for path in &self.select {
                write!(f, " {}", path.display())?;
            }
        }

        Ok(())
    }
}

/// `<hash> refs/heads/<branch>`
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct RefLine {
    pub oid: ObjectId,
    pub branch: BranchName,
}

impl RefLine {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let line = line.trim_end();
        let (oid, ref_path) = line
            .split_once(' ')
            .ok_or_else(|| BruvError::InvalidRef(format!("malformed ref line '{line}'")))?;
        let branch = ref_path
            .strip_prefix(REF_PREFIX)
            .ok_or_else(|| BruvError::InvalidRef(format!("'{ref_path}' is not a branch")))?;

        Ok(RefLine {
            oid: ObjectId::try_parse(oid.to_string())
                .map_err(|_| BruvError::InvalidRef(format!("'{oid}' is not an object id")))?,
            branch: BranchName::try_parse(branch)?,
        })
    }
}

impl std::fmt::Display for RefLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.oid, self.branch.to_ref_path())
    }
}

/// `<source-branch> <target-branch> [<requester>]`
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct MergeRequestLine {
    pub source: BranchName,
    pub target: BranchName,
    pub requester: Option<String>,
}

impl MergeRequestLine {
    pub fn parse(line: &str) -> anyhow::Result<Self> {
        let words = line.split_whitespace().collect::<Vec<_>>();
        match words.as_slice() {
            [source, target] | [source, target, _] => Ok(MergeRequestLine {
                source: BranchName::try_parse(*source)?,
                target: BranchName::try_parse(*target)?,
                requester: words.get(2).map(|requester| requester.to_string()),
            }),
            _ => Err(BruvError::InvalidState(format!(
                "invalid merge request format '{}'",
                line.trim_end()
            ))
            .into()),
        }
    }
}

impl std::fmt::Display for MergeRequestLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.source, self.target)?;
        if let Some(requester) = &self.requester {
            write!(f, " {requester}")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn command_line_with_branch_and_selection() {
        let command =
            CommandLine::parse("upload-pack repos/app --branch feature --select src docs/guide.md")
                .unwrap();

        assert_eq!(command.verb, Verb::UploadPack);
        assert_eq!(command.repository, "repos/app");
        assert_eq!(command.branch, Some(BranchName::try_parse("feature").unwrap()));
        assert_eq!(command.select, vec![PathBuf::from("src"), PathBuf::from("docs/guide.md")]);
        assert_eq!(CommandLine::parse(&command.to_string()).unwrap(), command);
    }

    #[rstest]
    #[case("")]
    #[case("fetch-pack repo")]
    #[case("upload-pack")]
    #[case("upload-pack repo --branch")]
    #[case("upload-pack repo --force")]
    fn malformed_command_lines_are_rejected(#[case] line: &str) {
        assert!(CommandLine::parse(line).is_err());
    }

    #[test]
    fn ref_line_names_a_branch() {
        let line =
            RefLine::parse("32f95c0d1244a78b2be1bab8de17906fabb2c4a8 refs/heads/main\n").unwrap();

        assert_eq!(line.branch.as_ref(), "main");
        assert_eq!(line.to_string(), "32f95c0d1244a78b2be1bab8de17906fabb2c4a8 refs/heads/main");
        assert!(RefLine::parse("32f95c0d1244a78b2be1bab8de17906fabb2c4a8 refs/tags/v1").is_err());
    }

    #[rstest]
    #[case("feature main", None)]
    #[case("feature main alice", Some("alice"))]
    fn merge_request_line_has_optional_requester(
        #[case] line: &str,
        #[case] requester: Option<&str>,
    ) {
        let parsed = MergeRequestLine::parse(line).unwrap();

        assert_eq!(parsed.requester.as_deref(), requester);
        assert_eq!(parsed.to_string(), line);
    }
}
