use async_trait::async_trait;
use openslot_core::ports::AccountDirectory;
use openslot_domain::{Account, Result as DomainResult};

/// Directory fake: two accounts are the same person exactly when their
/// identifiers match.
#[derive(Debug, Default, Clone, Copy)]
pub struct MockDirectory;

#[async_trait]
impl AccountDirectory for MockDirectory {
    async fn same_person(&self, a: &Account, b: &Account) -> DomainResult<bool> {
        Ok(a.id == b.id)
    }
}
