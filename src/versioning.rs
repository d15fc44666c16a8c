//! versioning
//!
//! The checkout → append → checkin workflow.
//!
//! # State machine
//!
//! A version series seen from one workflow is either `Idle` (no open
//! private working copy) or `CheckedOut` (a PWC exists). `CheckedOut`
//! ends in one of two ways, both returning to `Idle`: `check_in`
//! persists the appended content as a new version, `cancel` discards
//! the PWC. Invalid transitions fail as validation errors before any
//! network call.
//!
//! # Compensation
//!
//! The dispatcher never cleans up implicitly; cancelling a PWC after a
//! failed append is the caller's job. [`append_and_check_in`] is the
//! convenience that honors that contract: it checks out, appends, and
//! checks in — and cancels the PWC before surfacing any append or
//! checkin failure, so the series is never left checked out
//! indefinitely.
//!
//! # Example
//!
//! ```ignore
//! use cmis_browser::core::types::ContentStream;
//! use cmis_browser::versioning::{append_and_check_in, VersioningWorkflow};
//! use cmis_browser::client::options::CheckInOptions;
//!
//! // Step by step:
//! let mut workflow = VersioningWorkflow::new(&repo);
//! workflow.check_out(&doc.id).await?;
//! workflow.append(ContentStream::new("a.txt", b"v2".to_vec()), true).await?;
//! let new_version = workflow.check_in(&CheckInOptions::default()).await?;
//!
//! // Or in one compensated call:
//! let new_version = append_and_check_in(
//!     &repo,
//!     &doc.id,
//!     ContentStream::new("a.txt", b"v3".to_vec()),
//!     &CheckInOptions::default(),
//! ).await?;
//! ```

use crate::client::options::CheckInOptions;
use crate::client::RepositoryHandle;
use crate::core::types::{CmisObject, ContentStream, ObjectId};
use crate::error::CmisError;

/// Workflow state for one version series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersioningState {
    /// No open private working copy.
    Idle,
    /// A private working copy exists.
    CheckedOut {
        /// The PWC's object id.
        pwc: ObjectId,
    },
}

impl VersioningState {
    /// Whether the workflow holds an open PWC.
    pub fn is_checked_out(&self) -> bool {
        matches!(self, VersioningState::CheckedOut { .. })
    }
}

/// A stateful checkout/checkin sequence against one repository.
///
/// The workflow tracks which PWC it holds so content appends and the
/// terminal transition target the right object. One-PWC-per-series is
/// enforced by the remote repository, not here: a concurrent checkout
/// elsewhere surfaces as [`CmisError::VersioningConflict`], an ordinary
/// error.
#[derive(Debug)]
pub struct VersioningWorkflow<'a> {
    repository: &'a RepositoryHandle<'a>,
    state: VersioningState,
}

impl<'a> VersioningWorkflow<'a> {
    /// Start an idle workflow.
    pub fn new(repository: &'a RepositoryHandle<'a>) -> Self {
        Self {
            repository,
            state: VersioningState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &VersioningState {
        &self.state
    }

    /// `Idle → CheckedOut`: check out a document.
    ///
    /// # Errors
    ///
    /// `Validation` if this workflow already holds a PWC;
    /// `VersioningConflict` if the remote series does.
    pub async fn check_out(&mut self, document: &ObjectId) -> Result<CmisObject, CmisError> {
        if self.state.is_checked_out() {
            return Err(CmisError::Validation(
                "workflow already holds a private working copy".into(),
            ));
        }
        let pwc = self.repository.check_out(document).await?;
        self.state = VersioningState::CheckedOut {
            pwc: pwc.id.clone(),
        };
        Ok(pwc)
    }

    /// Append a content chunk to the held PWC.
    ///
    /// On failure the workflow stays `CheckedOut`; the caller decides
    /// between retrying, cancelling, or checking in what was appended
    /// so far.
    pub async fn append(
        &mut self,
        content: ContentStream,
        is_last_chunk: bool,
    ) -> Result<CmisObject, CmisError> {
        let pwc = self.held_pwc()?.clone();
        self.repository
            .append_content_stream(&pwc, content, is_last_chunk)
            .await
    }

    /// `CheckedOut → Idle` via `Cancelled`: discard the PWC.
    ///
    /// Always safe; any content appended since checkout is discarded.
    pub async fn cancel(&mut self) -> Result<(), CmisError> {
        let pwc = self.held_pwc()?.clone();
        self.repository.cancel_check_out(&pwc).await?;
        self.state = VersioningState::Idle;
        Ok(())
    }

    /// `CheckedOut → Idle` via `CheckedIn`: persist a new version.
    pub async fn check_in(&mut self, options: &CheckInOptions) -> Result<CmisObject, CmisError> {
        let pwc = self.held_pwc()?.clone();
        let version = self.repository.check_in(&pwc, options).await?;
        self.state = VersioningState::Idle;
        Ok(version)
    }

    fn held_pwc(&self) -> Result<&ObjectId, CmisError> {
        match &self.state {
            VersioningState::CheckedOut { pwc } => Ok(pwc),
            VersioningState::Idle => Err(CmisError::Validation(
                "workflow holds no private working copy".into(),
            )),
        }
    }
}

/// Append content and check in a new version as one compensated
/// sequence.
///
/// Checks the document out, appends `content` as the final chunk, and
/// checks the PWC in. If the append or the checkin fails, the PWC is
/// cancelled before the error surfaces — there is no path that checks
/// in after a failed append, and the series is not left checked out.
/// A cancel failure does not mask the original error.
pub async fn append_and_check_in(
    repository: &RepositoryHandle<'_>,
    document: &ObjectId,
    content: ContentStream,
    options: &CheckInOptions,
) -> Result<CmisObject, CmisError> {
    let mut workflow = VersioningWorkflow::new(repository);
    workflow.check_out(document).await?;

    if let Err(append_error) = workflow.append(content, true).await {
        let _ = workflow.cancel().await;
        return Err(append_error);
    }

    match workflow.check_in(options).await {
        Ok(version) => Ok(version),
        Err(checkin_error) => {
            let _ = workflow.cancel().await;
            Err(checkin_error)
        }
    }
}
