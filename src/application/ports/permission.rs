//! Microphone permission port interface

use async_trait::async_trait;

/// Port for the authority that grants microphone access
#[async_trait]
pub trait PermissionAuthority: Send + Sync {
    /// Ask for microphone access.
    ///
    /// May suspend until a human answers. Repeated calls re-resolve to the
    /// current grant state.
    async fn request_microphone_access(&self) -> bool;
}

#[async_trait]
impl<T: PermissionAuthority + ?Sized> PermissionAuthority for Box<T> {
    async fn request_microphone_access(&self) -> bool {
        (**self).request_microphone_access().await
    }
}
