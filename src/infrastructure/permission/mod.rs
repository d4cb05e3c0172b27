//! Microphone permission adapters

mod fixed;
mod prompt;

pub use fixed::FixedPermission;
pub use prompt::PromptPermission;

use crate::application::ports::PermissionAuthority;
use crate::domain::config::PermissionPolicy;
use crate::infrastructure::terminal::LineInput;

/// Create the permission authority for a configured policy.
/// `input` is only read when the policy is to ask.
pub fn create_permission_authority(
    policy: PermissionPolicy,
    input: LineInput,
) -> Box<dyn PermissionAuthority> {
    match policy {
        PermissionPolicy::Ask => Box::new(PromptPermission::new(input)),
        PermissionPolicy::Granted => Box::new(FixedPermission::new(true)),
        PermissionPolicy::Denied => Box::new(FixedPermission::new(false)),
    }
}
