//! Management surface
//!
//! Administrative operations over the subnet lists and the rate-limit
//! buckets: list edits go through the caching provider, listings read the
//! repository directly, resets clear counter windows.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::{ServiceError, StorageError};
use crate::types::ListKind;

/// Capability: mutate the subnet lists (write-through, cache-invalidating).
#[async_trait]
pub trait SubnetEditor: Send + Sync {
    /// Idempotent: adding an already-present `(kind, cidr)` pair succeeds.
    async fn add(&self, kind: ListKind, cidr: &str) -> Result<(), StorageError>;

    /// Returns the number of deleted entries (0 when absent).
    async fn remove(&self, kind: ListKind, cidr: &str) -> Result<u64, StorageError>;
}

/// Capability: paginated listing of one subnet list.
#[async_trait]
pub trait SubnetLister: Send + Sync {
    async fn list(
        &self,
        kind: ListKind,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>, StorageError>;
}

/// Capability: discard rate-limit windows.
///
/// Resets are idempotent; the returned flag reports whether a window
/// actually existed.
#[async_trait]
pub trait BucketResetter: Send + Sync {
    async fn reset_by_ip(&self, ip: &str) -> Result<bool, StorageError>;
    async fn reset_by_login(&self, login: &str) -> Result<bool, StorageError>;
    async fn reset_by_password(&self, password: &str) -> Result<bool, StorageError>;
}

/// The administrative service.
pub struct ManagementService {
    editor: Arc<dyn SubnetEditor>,
    lister: Arc<dyn SubnetLister>,
    resetter: Arc<dyn BucketResetter>,
}

impl ManagementService {
    pub fn new(
        editor: Arc<dyn SubnetEditor>,
        lister: Arc<dyn SubnetLister>,
        resetter: Arc<dyn BucketResetter>,
    ) -> Self {
        Self { editor, lister, resetter }
    }

    pub async fn add_subnet(&self, kind: ListKind, cidr: &str) -> Result<(), ServiceError> {
        self.editor.add(kind, cidr).await?;
        info!(list = kind.as_str(), %cidr, "subnet added");
        Ok(())
    }

    /// Removing an absent subnet is reported as [`ServiceError::SubnetNotFound`].
    pub async fn remove_subnet(&self, kind: ListKind, cidr: &str) -> Result<(), ServiceError> {
        let deleted = self.editor.remove(kind, cidr).await?;
        if deleted == 0 {
            return Err(ServiceError::SubnetNotFound);
        }
        info!(list = kind.as_str(), %cidr, "subnet removed");
        Ok(())
    }

    pub async fn list_subnets(
        &self,
        kind: ListKind,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<String>, ServiceError> {
        Ok(self.lister.list(kind, offset, limit).await?)
    }

    pub async fn reset_bucket_by_ip(&self, ip: &str) -> Result<bool, ServiceError> {
        Ok(self.resetter.reset_by_ip(ip).await?)
    }

    pub async fn reset_bucket_by_login(&self, login: &str) -> Result<bool, ServiceError> {
        Ok(self.resetter.reset_by_login(login).await?)
    }

    pub async fn reset_bucket_by_password(&self, password: &str) -> Result<bool, ServiceError> {
        Ok(self.resetter.reset_by_password(password).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeEditor {
        deleted: u64,
        added: Mutex<Vec<(ListKind, String)>>,
    }

    #[async_trait]
    impl SubnetEditor for FakeEditor {
        async fn add(&self, kind: ListKind, cidr: &str) -> Result<(), StorageError> {
            self.added.lock().unwrap().push((kind, cidr.to_string()));
            Ok(())
        }

        async fn remove(&self, _kind: ListKind, _cidr: &str) -> Result<u64, StorageError> {
            Ok(self.deleted)
        }
    }

    struct FakeLister;

    #[async_trait]
    impl SubnetLister for FakeLister {
        async fn list(
            &self,
            _kind: ListKind,
            offset: u64,
            _limit: u64,
        ) -> Result<Vec<String>, StorageError> {
            if offset > 0 {
                return Ok(vec![]);
            }
            Ok(vec!["10.0.0.0/24".to_string(), "192.168.0.0/16".to_string()])
        }
    }

    struct FakeResetter {
        existed: bool,
    }

    #[async_trait]
    impl BucketResetter for FakeResetter {
        async fn reset_by_ip(&self, _ip: &str) -> Result<bool, StorageError> {
            Ok(self.existed)
        }

        async fn reset_by_login(&self, _login: &str) -> Result<bool, StorageError> {
            Ok(self.existed)
        }

        async fn reset_by_password(&self, _password: &str) -> Result<bool, StorageError> {
            Ok(self.existed)
        }
    }

    fn service(editor: FakeEditor, existed: bool) -> ManagementService {
        ManagementService::new(
            Arc::new(editor),
            Arc::new(FakeLister),
            Arc::new(FakeResetter { existed }),
        )
    }

    #[tokio::test]
    async fn add_forwards_list_kind_and_cidr() {
        let editor = Arc::new(FakeEditor::default());
        let svc = ManagementService::new(
            editor.clone(),
            Arc::new(FakeLister),
            Arc::new(FakeResetter { existed: true }),
        );

        svc.add_subnet(ListKind::Deny, "10.0.0.0/8").await.unwrap();

        let added = editor.added.lock().unwrap();
        assert_eq!(added.as_slice(), &[(ListKind::Deny, "10.0.0.0/8".to_string())]);
    }

    #[tokio::test]
    async fn remove_of_absent_subnet_is_not_found() {
        let svc = service(FakeEditor { deleted: 0, ..Default::default() }, true);

        let err = svc.remove_subnet(ListKind::Allow, "10.0.0.0/8").await.unwrap_err();
        assert!(matches!(err, ServiceError::SubnetNotFound));
    }

    #[tokio::test]
    async fn remove_of_existing_subnet_succeeds() {
        let svc = service(FakeEditor { deleted: 1, ..Default::default() }, true);

        svc.remove_subnet(ListKind::Allow, "10.0.0.0/8").await.unwrap();
    }

    #[tokio::test]
    async fn listing_paginates_through_the_lister() {
        let svc = service(FakeEditor::default(), true);

        let first = svc.list_subnets(ListKind::Allow, 0, 10).await.unwrap();
        assert_eq!(first.len(), 2);

        let rest = svc.list_subnets(ListKind::Allow, 2, 10).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn reset_reports_whether_a_bucket_existed() {
        let svc = service(FakeEditor::default(), true);
        assert!(svc.reset_bucket_by_login("bob").await.unwrap());

        let svc = service(FakeEditor::default(), false);
        assert!(!svc.reset_bucket_by_ip("10.0.0.1").await.unwrap());
        assert!(!svc.reset_bucket_by_password("hunter2").await.unwrap());
    }
}
