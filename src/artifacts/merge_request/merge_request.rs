use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::merge_request::status::Status;
use crate::artifacts::objects::object::{Packable, Unpackable};
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;
use bytes::Bytes;
use derive_new::new;
use std::collections::HashMap;
use std::io::BufRead;

const ID_PREFIX: &str = "MR-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, new)]
pub struct MergeRequestId(u64);

impl MergeRequestId {
    /// Accepts `MR-<n>` or a bare `<n>`
    pub fn try_parse(id: &str) -> anyhow::Result<Self> {
        let number = id.strip_prefix(ID_PREFIX).unwrap_or(id);

        number
            .parse::<u64>()
            .map(MergeRequestId)
            .map_err(|_| BruvError::NotFound(format!("merge request '{id}'")).into())
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn next(&self) -> anyhow::Result<Self> {
        self.0
            .checked_add(1)
            .map(MergeRequestId)
            .ok_or_else(|| BruvError::Conflict(format!("no merge request id after {self}")).into())
    }

    pub fn file_name(&self) -> String {
        format!("mr-{}.txt", self.0)
    }

    /// Parse an `mr-<n>.txt` file name
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        file_name
            .strip_prefix("mr-")?
            .strip_suffix(".txt")?
            .parse::<u64>()
            .ok()
            .map(MergeRequestId)
    }
}

impl std::fmt::Display for MergeRequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{ID_PREFIX}{}", self.0)
    }
}

/// Who closed a request and when
#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct Review {
    pub reviewer: String,
    pub at: i64,
}

/// A request to fast-forward `target` to `source`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeRequest {
    id: MergeRequestId,
    source: BranchName,
    target: BranchName,
    source_hash: ObjectId,
    target_hash: ObjectId,
    status: Status,
    requester: String,
    created_at: i64,
    review: Option<Review>,
}

impl MergeRequest {
    /// A new pending request; the id is assigned when it is persisted
    pub fn pending(
        source: BranchName,
        target: BranchName,
        source_hash: ObjectId,
        target_hash: ObjectId,
        requester: String,
    ) -> Self {
        MergeRequest {
            id: MergeRequestId(0),
            source,
            target,
            source_hash,
            target_hash,
            status: Status::Pending,
            requester,
            created_at: chrono::Utc::now().timestamp(),
            review: None,
        }
    }

    pub fn with_id(self, id: MergeRequestId) -> Self {
        MergeRequest { id, ..self }
    }

    pub fn id(&self) -> MergeRequestId {
        self.id
    }

    pub fn source(&self) -> &BranchName {
        &self.source
    }

    pub fn target(&self) -> &BranchName {
        &self.target
    }

    pub fn source_hash(&self) -> &ObjectId {
        &self.source_hash
    }

    pub fn target_hash(&self) -> &ObjectId {
        &self.target_hash
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn requester(&self) -> &str {
        &self.requester
    }

    pub fn review(&self) -> Option<&Review> {
        self.review.as_ref()
    }

    pub fn ensure_pending(&self) -> anyhow::Result<()> {
        if self.status.is_terminal() {
            return Err(
                BruvError::InvalidState(format!("{} is already {}", self.id, self.status)).into(),
            );
        }

        Ok(())
    }

    pub fn approve(&mut self, approver: String) -> anyhow::Result<()> {
        self.close(Status::Approved, approver)
    }

    pub fn reject(&mut self, reviewer: String) -> anyhow::Result<()> {
        self.close(Status::Rejected, reviewer)
    }

    fn close(&mut self, status: Status, reviewer: String) -> anyhow::Result<()> {
        self.ensure_pending()?;

        self.status = status;
        self.review = Some(Review::new(reviewer, chrono::Utc::now().timestamp()));

        Ok(())
    }

    fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Source: {}", self.source),
            format!("Target: {}", self.target),
            format!("SourceHash: {}", self.source_hash),
            format!("TargetHash: {}", self.target_hash),
            format!("Status: {}", self.status),
            format!("Timestamp: {}", self.created_at),
            format!("Requester: {}", self.requester),
        ];

        match (&self.status, &self.review) {
            (Status::Approved, Some(review)) => {
                lines.push(format!("ApprovedBy: {}", review.reviewer));
                lines.push(format!("ApprovedAt: {}", review.at));
            }
            (Status::Rejected, Some(review)) => {
                lines.push(format!("RejectedBy: {}", review.reviewer));
                lines.push(format!("RejectedAt: {}", review.at));
            }
            _ => {}
        }

        lines
    }
}

impl Packable for MergeRequest {
    fn serialize(&self) -> anyhow::Result<Bytes> {
        let mut content = self.lines().join("\n");
        content.push('\n');

        Ok(Bytes::from(content))
    }
}

impl Unpackable for MergeRequest {
    /// Parse a request file; the id comes from the file name
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let fields = reader
            .lines()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter_map(|line| {
                line.split_once(": ")
                    .map(|(key, value)| (key.to_string(), value.trim().to_string()))
            })
            .collect::<HashMap<_, _>>();

        let field = |key: &str| {
            fields
                .get(key)
                .map(String::as_str)
                .ok_or_else(|| BruvError::InvalidState(format!("merge request is missing '{key}'")))
        };
        let timestamp = |key: &str| -> anyhow::Result<i64> {
            field(key)?
                .parse::<i64>()
                .with_context(|| format!("merge request has an invalid '{key}'"))
        };

        let status = Status::try_from(field("Status")?)?;
        let review = match status {
            Status::Pending => None,
            Status::Approved => Some(Review::new(
                field("ApprovedBy")?.to_string(),
                timestamp("ApprovedAt")?,
            )),
            Status::Rejected => Some(Review::new(
                field("RejectedBy")?.to_string(),
                timestamp("RejectedAt")?,
            )),
        };

        Ok(MergeRequest {
            id: MergeRequestId(0),
            source: BranchName::try_parse(field("Source")?)?,
            target: BranchName::try_parse(field("Target")?)?,
            source_hash: ObjectId::try_parse(field("SourceHash")?.to_string())?,
            target_hash: ObjectId::try_parse(field("TargetHash")?.to_string())?,
            status,
            requester: field("Requester").unwrap_or("user").to_string(),
            created_at: timestamp("Timestamp")?,
            review,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::object_type::ObjectType;
    use pretty_assertions::assert_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn request() -> MergeRequest {
        MergeRequest::pending(
            BranchName::try_parse("feature").unwrap(),
            BranchName::try_parse("main").unwrap(),
            ObjectId::for_content(ObjectType::Commit, b"source"),
            ObjectId::for_content(ObjectType::Commit, b"target"),
            "alice".to_string(),
        )
        .with_id(MergeRequestId::new(7))
    }

    fn reparse(request: &MergeRequest) -> MergeRequest {
        MergeRequest::deserialize(std::io::Cursor::new(request.serialize().unwrap()))
            .unwrap()
            .with_id(request.id())
    }

    #[rstest]
    fn pending_request_file_lists_captured_hashes(request: MergeRequest) {
        let content = String::from_utf8(request.serialize().unwrap().to_vec()).unwrap();

        assert!(content.starts_with("Source: feature\nTarget: main\nSourceHash: "));
        assert!(content.contains("Status: pending\n"));
        assert!(content.ends_with("Requester: alice\n"));
        assert_eq!(reparse(&request), request);
    }

    #[rstest]
    fn approval_appends_reviewer_fields(mut request: MergeRequest) {
        request.approve("owner".to_string()).unwrap();

        let content = String::from_utf8(request.serialize().unwrap().to_vec()).unwrap();

        assert!(content.contains("Status: approved\n"));
        assert!(content.contains("ApprovedBy: owner\nApprovedAt: "));
        assert_eq!(reparse(&request), request);
    }

    #[rstest]
    fn closed_requests_cannot_change_again(mut request: MergeRequest) {
        request.reject("owner".to_string()).unwrap();

        let error = request.approve("owner".to_string()).unwrap_err();

        assert_eq!(request.status(), Status::Rejected);
        assert!(matches!(BruvError::classify(&error), Some(BruvError::InvalidState(_))));
    }

    #[rstest]
    #[case("MR-12", 12)]
    #[case("12", 12)]
    fn ids_parse_with_or_without_prefix(#[case] raw: &str, #[case] expected: u64) {
        assert_eq!(MergeRequestId::try_parse(raw).unwrap().value(), expected);
    }

    #[test]
    fn last_id_has_no_successor() {
        assert_eq!(MergeRequestId::new(7).next().unwrap(), MergeRequestId::new(8));

        let error = MergeRequestId::new(u64::MAX).next().unwrap_err();

        assert!(matches!(BruvError::classify(&error), Some(BruvError::Conflict(_))));
    }

    #[test]
    fn id_round_trips_through_file_name() {
        let id = MergeRequestId::new(3);

        assert_eq!(MergeRequestId::from_file_name(&id.file_name()), Some(id));
        assert_eq!(MergeRequestId::from_file_name("notes.txt"), None);
        assert_eq!(id.to_string(), "MR-3");
    }
}
