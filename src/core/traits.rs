//! The backend strategy trait.
//!
//! The dispatcher holds one [`Backend`] per [`TargetKind`]. URL and file
//! analysis are interchangeable strategies behind this trait and share the
//! dispatcher's normalization step.

use crate::core::error::DispatchError;
use crate::core::result::ScanResult;
use crate::core::types::{ScanRequest, TargetKind};

use async_trait::async_trait;
use std::fmt::Debug;

/// An analysis backend for one kind of target.
///
/// # Implementation Notes
///
/// - Implementations must be `Send + Sync`; the dispatcher shares them
///   across bridge instances.
/// - `scan` must enforce its own time bound and report it as
///   [`DispatchError::Timeout`].
/// - Implementations should never panic; the dispatcher catches panics but
///   reports them only as internal errors.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use sentinel_bridge::core::{Backend, DispatchError, ScanRequest, ScanResult, TargetKind};
/// use async_trait::async_trait;
///
/// #[derive(Debug)]
/// struct AlwaysClean;
///
/// #[async_trait]
/// impl Backend for AlwaysClean {
///     fn name(&self) -> &str {
///         "always-clean"
///     }
///
///     fn kind(&self) -> TargetKind {
///         TargetKind::File
///     }
///
///     async fn scan(&self, request: &ScanRequest) -> Result<ScanResult, DispatchError> {
///         todo!()
///     }
/// }
/// ```
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    /// Returns a stable identifier like `"url"` or `"sandbox"`.
    fn name(&self) -> &str;

    /// Returns the kind of target this backend analyzes.
    fn kind(&self) -> TargetKind;

    /// Analyzes the request's target.
    ///
    /// # Errors
    ///
    /// - `Transport` / `HttpStatus` - the remote classifier failed.
    /// - `Timeout` - the backend exceeded its bound.
    /// - `ProcessFailed` / `Spawn` - the sandbox executable failed.
    /// - `Extraction` - the sandbox output held no usable result.
    async fn scan(&self, request: &ScanRequest) -> Result<ScanResult, DispatchError>;
}

/// An arc-wrapped backend for shared ownership.
pub type ArcBackend = std::sync::Arc<dyn Backend>;
