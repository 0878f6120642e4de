use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::core::error::BruvError;
use crate::artifacts::merge_request::merge_request::{MergeRequest, MergeRequestId};
use crate::artifacts::merge_request::resolver::{FastForwardOnly, MergeResolver};
use crate::artifacts::merge_request::status::Status;
use crate::artifacts::objects::object_id::ObjectId;
use anyhow::Context;

impl Repository {
    /// Record a pending request to move `target` to the tip of `source`
    pub fn submit_merge_request(
        &self,
        source: &BranchName,
        target: &BranchName,
        requester: String,
    ) -> anyhow::Result<MergeRequest> {
        if !target.is_protected() {
            return Err(BruvError::InvalidRef(format!(
                "merge requests may only target main or master, not '{target}'"
            ))
            .into());
        }
        if source == target {
            return Err(BruvError::InvalidRef(
                "source and target branches cannot be the same".into(),
            )
            .into());
        }

        let source_hash = self.branch_tip(source, "source")?;
        let target_hash = self.branch_tip(target, "target")?;

        let merge_request = self.merge_requests().create(MergeRequest::pending(
            source.clone(),
            target.clone(),
            source_hash,
            target_hash,
            requester,
        ))?;

        tracing::info!(
            id = %merge_request.id(),
            source = %source,
            target = %target,
            "merge request created"
        );

        Ok(merge_request)
    }

    pub fn approve(&self, id: &str, approver: String) -> anyhow::Result<()> {
        self.approve_with(id, approver, &FastForwardOnly)
    }

    /// Approve a pending request, moving its target branch
    ///
    /// Fails with Conflict if either branch moved since the request was
    /// created. Histories that are not a fast-forward go to `resolver`.
    pub fn approve_with(
        &self,
        id: &str,
        approver: String,
        resolver: &dyn MergeResolver,
    ) -> anyhow::Result<()> {
        let id = MergeRequestId::try_parse(id)?;
        let mut merge_request = self.merge_requests().load(id)?;
        merge_request.ensure_pending()?;

        self.ensure_unmoved(merge_request.source(), merge_request.source_hash(), id)?;
        self.ensure_unmoved(merge_request.target(), merge_request.target_hash(), id)?;

        let new_tip = if self
            .database()
            .is_ancestor(merge_request.target_hash(), merge_request.source_hash())
            .with_context(|| format!("checking history of {id}"))?
        {
            merge_request.source_hash().clone()
        } else {
            resolver.resolve(self.database(), &merge_request)?
        };

        // the record is written before the ref so a failed save never moves the target
        let pending = merge_request.clone();
        merge_request.approve(approver)?;
        self.merge_requests().save(&merge_request)?;

        if let Err(err) = self.refs().update_ref(merge_request.target(), &new_tip) {
            if let Err(restore_err) = self.merge_requests().save(&pending) {
                tracing::warn!(
                    id = %id,
                    error = %restore_err,
                    "could not restore pending merge request"
                );
            }
            return Err(err.context(format!("moving {} for {id}", merge_request.target())));
        }

        tracing::info!(
            id = %id,
            target = %merge_request.target(),
            tip = %new_tip,
            "merge request approved"
        );
        writeln!(
            self.writer(),
            "Merge request {id} approved: {} is now at {}",
            merge_request.target(),
            new_tip.to_short_oid()
        )?;

        Ok(())
    }

    /// Close a pending request without touching any branch
    pub fn reject(&self, id: &str, reviewer: String) -> anyhow::Result<()> {
        let id = MergeRequestId::try_parse(id)?;
        let mut merge_request = self.merge_requests().load(id)?;

        merge_request.reject(reviewer)?;
        self.merge_requests().save(&merge_request)?;

        tracing::info!(id = %id, "merge request rejected");
        writeln!(self.writer(), "Merge request {id} rejected")?;

        Ok(())
    }

    pub fn list_requests(&self) -> anyhow::Result<()> {
        let merge_requests = self.merge_requests().list()?;
        if merge_requests.is_empty() {
            writeln!(self.writer(), "No merge requests found")?;
            return Ok(());
        }

        writeln!(self.writer(), "Merge Requests:")?;
        writeln!(self.writer(), "===============")?;

        for merge_request in &merge_requests {
            writeln!(
                self.writer(),
                "{}: {} -> {} [{}]",
                merge_request.id(),
                merge_request.source(),
                merge_request.target(),
                merge_request.status()
            )?;
            if merge_request.status() == Status::Pending {
                writeln!(
                    self.writer(),
                    "  Use 'bruv approve {}' to approve this merge request",
                    merge_request.id().value()
                )?;
            }
            writeln!(self.writer(), "  Requested by: {}", merge_request.requester())?;
            if let Some(review) = merge_request.review() {
                let verdict = if merge_request.status() == Status::Approved {
                    "Approved"
                } else {
                    "Rejected"
                };
                writeln!(self.writer(), "  {verdict} by: {}", review.reviewer)?;
            }
            writeln!(self.writer())?;
        }

        let count = |status: Status| {
            merge_requests
                .iter()
                .filter(|merge_request| merge_request.status() == status)
                .count()
        };
        writeln!(
            self.writer(),
            "Summary: {} pending, {} approved, {} rejected",
            count(Status::Pending),
            count(Status::Approved),
            count(Status::Rejected)
        )?;

        Ok(())
    }

    fn branch_tip(&self, branch: &BranchName, role: &str) -> anyhow::Result<ObjectId> {
        self.refs()
            .read_ref(branch)?
            .ok_or_else(|| {
                BruvError::NotFound(format!("{role} branch '{branch}' does not exist")).into()
            })
    }

    fn ensure_unmoved(
        &self,
        branch: &BranchName,
        captured: &ObjectId,
        id: MergeRequestId,
    ) -> anyhow::Result<()> {
        let current = self.refs().read_ref(branch)?;

        if current.as_ref() != Some(captured) {
            return Err(BruvError::Conflict(format!(
                "{branch} moved since {id} was created; submit a new merge request"
            ))
            .into());
        }

        Ok(())
    }
}
