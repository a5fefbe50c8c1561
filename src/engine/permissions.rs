//! Permission checks used by rules that trust maintainers over outsiders

use crate::github::{GatewayError, PermissionLevel, PlatformGateway, Repository, ADMIN_OR_WRITE};
use crate::Result;
use tracing::debug;

/// True when `login` holds one of `levels` on the repository
///
/// Bots and deleted accounts have no collaborator record; the gateway reports
/// them as `NotAUser`, which is answered with `false`. Any other failure is
/// returned to the caller.
pub async fn has_any_permission(
    gateway: &dyn PlatformGateway,
    repository_id: u64,
    login: &str,
    levels: &[PermissionLevel],
) -> Result<bool> {
    match gateway.collaborator_permission(repository_id, login).await {
        Ok(level) => Ok(levels.contains(&level)),
        Err(GatewayError::NotAUser { login }) => {
            debug!(login = %login, "Not a user; treating as having no permission");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Admin/Write collaborator, or a member of the owning organization
pub async fn is_maintainer_or_member(
    gateway: &dyn PlatformGateway,
    repository: &Repository,
    login: &str,
) -> Result<bool> {
    if has_any_permission(gateway, repository.id, login, ADMIN_OR_WRITE).await? {
        return Ok(true);
    }
    Ok(gateway.is_org_member(&repository.owner.login, login).await?)
}
