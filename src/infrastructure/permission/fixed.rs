//! Permission with a configured answer

use async_trait::async_trait;

use crate::application::ports::PermissionAuthority;

/// Always answers the same way, without asking
pub struct FixedPermission {
    granted: bool,
}

impl FixedPermission {
    pub fn new(granted: bool) -> Self {
        Self { granted }
    }
}

#[async_trait]
impl PermissionAuthority for FixedPermission {
    async fn request_microphone_access(&self) -> bool {
        self.granted
    }
}
