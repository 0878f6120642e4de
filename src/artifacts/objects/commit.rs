//! Commit object
//!
//! Commits represent snapshots of the repository at specific points in time.
//! History is linear: a commit names one tree and at most one parent.
//!
//! ## Format
//!
//! On disk:
//! ```text
//! commit <size>\0
//! tree <tree-sha>
//! parent <parent-sha>
//! author <name> <email> <timestamp> <timezone>
//! committer <name> <email> <timestamp> <timezone>
//!
//! <commit message>
//! ```

use crate::artifacts::core::error::BruvError;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::io::BufRead;

const AUTHOR_NAME_VAR: &str = "BRUV_AUTHOR_NAME";
const AUTHOR_EMAIL_VAR: &str = "BRUV_AUTHOR_EMAIL";
const AUTHOR_DATE_VAR: &str = "BRUV_AUTHOR_DATE";

/// Author or committer information
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Author {
    name: String,
    email: String,
    timestamp: chrono::DateTime<chrono::FixedOffset>,
}

impl Author {
    /// Create a new author stamped with the current time
    pub fn new(name: String, email: String) -> Self {
        Author {
            name,
            email,
            timestamp: chrono::Local::now().fixed_offset(),
        }
    }

    pub fn new_with_timestamp(
        name: String,
        email: String,
        timestamp: chrono::DateTime<chrono::FixedOffset>,
    ) -> Self {
        Author {
            name,
            email,
            timestamp,
        }
    }

    /// "Name <email> timestamp timezone"
    pub fn display(&self) -> String {
        format!(
            "{} <{}> {} {}",
            self.name,
            self.email,
            self.timestamp.timestamp(),
            self.timestamp.format("%z")
        )
    }

    /// Load author information from the environment
    ///
    /// Reads BRUV_AUTHOR_NAME, BRUV_AUTHOR_EMAIL and optionally
    /// BRUV_AUTHOR_DATE. The name falls back to the login user and the email
    /// to `<name>@localhost`.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let name = std::env::var(AUTHOR_NAME_VAR)
            .or_else(|_| std::env::var("USER"))
            .unwrap_or_else(|_| "bruv".to_string());
        let email = std::env::var(AUTHOR_EMAIL_VAR).unwrap_or_else(|_| format!("{name}@localhost"));
        let timestamp = std::env::var(AUTHOR_DATE_VAR).ok().and_then(|date_str| {
            chrono::DateTime::parse_from_rfc2822(&date_str)
                .or_else(|_| chrono::DateTime::parse_from_str(&date_str, "%Y-%m-%d %H:%M:%S %z"))
                .ok()
        });

        match timestamp {
            Some(ts) => Ok(Author::new_with_timestamp(name, email, ts)),
            None => Ok(Author::new(name, email)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// "Name <email>"
    pub fn display_name(&self) -> String {
        format!("{} <{}>", self.name, self.email)
    }

    /// "Mon Jan 1 12:34:56 2024 +0000"
    pub fn readable_timestamp(&self) -> String {
        self.timestamp
            .format("%a %b %-d %H:%M:%S %Y %z")
            .to_string()
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.timestamp
    }
}

impl TryFrom<&str> for Author {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let parts: Vec<&str> = value.rsplitn(3, ' ').collect();
        if parts.len() < 3 {
            return Err(anyhow::anyhow!("Invalid author format"));
        }

        let timezone = parts[0];
        let timestamp = parts[1]
            .parse::<i64>()
            .map_err(|_| anyhow::anyhow!("Invalid timestamp"))?;
        let name_email_part = parts[2];

        let email_start = name_email_part
            .find('<')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '<'"))?;
        let email_end = name_email_part
            .rfind('>')
            .ok_or_else(|| anyhow::anyhow!("Invalid author format: missing '>'"))?;
        if email_end < email_start {
            return Err(anyhow::anyhow!("Invalid author format: '>' before '<'"));
        }

        let name = name_email_part[..email_start].trim().to_string();
        let email = name_email_part[email_start + 1..email_end].to_string();

        let offset = chrono::DateTime::parse_from_str(
            &format!("1970-01-01 00:00:00 {timezone}"),
            "%Y-%m-%d %H:%M:%S %z",
        )
        .map_err(|_| anyhow::anyhow!("Invalid timezone"))?
        .offset()
        .to_owned();
        let timestamp = chrono::DateTime::from_timestamp(timestamp, 0)
            .ok_or_else(|| anyhow::anyhow!("Invalid timestamp"))?
            .with_timezone(&offset);

        Ok(Author {
            name,
            email,
            timestamp,
        })
    }
}

/// Commit object
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Commit {
    /// Parent commit (None for the initial commit)
    parent: Option<ObjectId>,
    tree_oid: ObjectId,
    author: Author,
    committer: Author,
    message: String,
}

impl Commit {
    pub fn new(
        parent: Option<ObjectId>,
        tree_oid: ObjectId,
        author: Author,
        message: String,
    ) -> Self {
        Commit {
            parent,
            tree_oid,
            author: author.clone(),
            committer: author,
            message,
        }
    }

    /// First line of the commit message
    pub fn short_message(&self) -> String {
        self.message.lines().next().unwrap_or("").to_string()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn tree_oid(&self) -> &ObjectId {
        &self.tree_oid
    }

    pub fn parent(&self) -> Option<&ObjectId> {
        self.parent.as_ref()
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn timestamp(&self) -> chrono::DateTime<chrono::FixedOffset> {
        self.author.timestamp()
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = vec![format!("tree {}", self.tree_oid)];
        if let Some(parent) = &self.parent {
            lines.push(format!("parent {parent}"));
        }
        lines.push(format!("author {}", self.author.display()));
        lines.push(format!("committer {}", self.committer.display()));
        lines.push(String::new());
        lines.push(self.message.to_string());

        lines
    }
}

impl Packable for Commit {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        Ok(Bytes::from(self.lines().join("\n")))
    }
}

impl Unpackable for Commit {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let content = reader
            .bytes()
            .collect::<Result<Vec<u8>, std::io::Error>>()?;
        let content = String::from_utf8(content)
            .map_err(|_| BruvError::CorruptObject("commit is not valid UTF-8".into()))?;

        Self::parse(&content).map_err(|err| BruvError::CorruptObject(format!("{err:#}")).into())
    }
}

impl Commit {
    fn parse(content: &str) -> anyhow::Result<Self> {
        let mut lines = content.lines();

        let tree_oid = lines
            .next()
            .and_then(|line| line.strip_prefix("tree "))
            .context("missing tree line")?;
        let tree_oid = ObjectId::try_parse(tree_oid.to_string())?;

        let mut next_line = lines.next().context("missing author line")?;
        let mut parent = None;

        if let Some(parent_oid) = next_line.strip_prefix("parent ") {
            parent = Some(ObjectId::try_parse(parent_oid.to_string())?);
            next_line = lines.next().context("missing author line")?;
        }
        if next_line.starts_with("parent ") {
            anyhow::bail!("merge commits are not supported");
        }

        let author = next_line
            .strip_prefix("author ")
            .context("invalid author line")?;
        let author = Author::try_from(author)?;

        let committer = lines
            .next()
            .and_then(|line| line.strip_prefix("committer "))
            .context("missing committer line")?;
        let committer = Author::try_from(committer)?;

        // skip the empty separator line
        lines.next();
        let message = lines.collect::<Vec<&str>>().join("\n");

        Ok(Commit {
            parent,
            tree_oid,
            author,
            committer,
            message,
        })
    }
}

impl Object for Commit {
    fn object_type(&self) -> ObjectType {
        ObjectType::Commit
    }

    fn display(&self) -> String {
        self.lines().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn author() -> Author {
        Author::new_with_timestamp(
            "fake_user".to_string(),
            "fake_email@email.com".to_string(),
            chrono::DateTime::parse_from_str("2023-01-01 12:00:00 +0200", "%Y-%m-%d %H:%M:%S %z")
                .unwrap(),
        )
    }

    #[fixture]
    fn tree_oid() -> ObjectId {
        ObjectId::for_content(ObjectType::Tree, b"")
    }

    #[rstest]
    fn commit_with_parent_parses_back(author: Author, tree_oid: ObjectId) {
        let parent = ObjectId::for_content(ObjectType::Commit, b"parent");
        let commit = Commit::new(Some(parent), tree_oid, author, "first\n\nbody".to_string());

        let raw = commit.serialize().unwrap();
        let parsed = Commit::deserialize(std::io::Cursor::new(raw)).unwrap();

        assert_eq!(parsed, commit);
        assert_eq!(parsed.object_id().unwrap(), commit.object_id().unwrap());
    }

    #[rstest]
    fn author_line_keeps_timezone(author: Author) {
        assert_eq!(
            author.display(),
            "fake_user <fake_email@email.com> 1672567200 +0200"
        );
        assert_eq!(Author::try_from(author.display().as_str()).unwrap(), author);
    }

    #[rstest]
    #[case("x>y <z")]
    #[case("name email>")]
    #[case("name <email")]
    fn malformed_author_lines_are_corrupt(tree_oid: ObjectId, #[case] identity: &str) {
        let raw = format!(
            "tree {tree_oid}\nauthor {identity} 1 +0000\ncommitter {identity} 1 +0000\n\nmessage"
        );

        let error = Commit::deserialize(std::io::Cursor::new(raw.into_bytes())).unwrap_err();

        assert!(matches!(
            BruvError::classify(&error),
            Some(BruvError::CorruptObject(_))
        ));
    }

    #[rstest]
    fn commits_with_two_parents_are_corrupt(author: Author, tree_oid: ObjectId) {
        let commit = Commit::new(None, tree_oid.clone(), author.clone(), "m".to_string());
        let raw = commit.serialize().unwrap();
        let raw = String::from_utf8(raw.to_vec()).unwrap().replacen(
            "\nauthor",
            &format!("\nparent {tree_oid}\nparent {tree_oid}\nauthor"),
            1,
        );

        let error = Commit::deserialize(std::io::Cursor::new(raw.into_bytes())).unwrap_err();

        assert!(matches!(
            BruvError::classify(&error),
            Some(BruvError::CorruptObject(_))
        ));
    }
}
