//! Credential source seam.

use super::value_object::Credential;

/// Synchronous access to the client's stored credential.
///
/// Read once per connection attempt; `None` means no usable token.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialSource: Send + Sync {
    fn read(&self) -> Option<Credential>;
}
