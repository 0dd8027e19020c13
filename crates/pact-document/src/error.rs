//! Error types for the pact-document renderer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("page height {0} is too small; at least {min} lines are needed", min = crate::MIN_PAGE_LINES)]
  PageTooShort(usize),

  #[error("page width {0} is too narrow; at least {min} columns are needed", min = crate::MIN_PAGE_WIDTH)]
  PageTooNarrow(usize),
}

impl From<Error> for pact_core::Error {
  fn from(e: Error) -> Self { pact_core::Error::RenderFailed(e.to_string()) }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
