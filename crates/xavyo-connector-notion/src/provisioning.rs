//! User deprovisioning through the SCIM API.

use tracing::{info, instrument, warn};

use crate::users::normalize_scim_user;
use crate::{NotionConnector, NotionError, NotionResult};

impl NotionConnector {
    /// Removes a user from the workspace and confirms the removal.
    ///
    /// The delete call returns no body, so success is only reported once a
    /// follow-up lookup of the same id answers "not found". A user that is
    /// already gone counts as removed.
    ///
    /// # Errors
    ///
    /// - `NotConfigured` without a SCIM token.
    /// - Upstream errors from the delete call itself.
    /// - `DeprovisionVerificationFailed` if the user is still found or the
    ///   lookup fails for another reason.
    #[instrument(skip(self))]
    pub async fn deprovision_user(&self, user_id: &str) -> NotionResult<()> {
        let scim_client = self.require_scim()?;

        info!("Deleting user: {}", user_id);
        match scim_client.delete_user(user_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                info!("User {} was already absent", user_id);
            }
            Err(e) => return Err(e),
        }

        match scim_client.get_user(user_id).await {
            Err(e) if e.is_not_found() => {
                info!("User deprovisioned: {}", user_id);
                Ok(())
            }
            Ok(user) => {
                let identity = normalize_scim_user(&user);
                warn!(
                    "User {} ({}) still exists after delete",
                    user_id, identity.email
                );
                Err(NotionError::DeprovisionVerificationFailed {
                    user_id: user_id.to_string(),
                    reason: format!("user {} still exists", identity.display_name),
                })
            }
            Err(e) => {
                warn!("Could not verify removal of user {}: {}", user_id, e);
                Err(NotionError::DeprovisionVerificationFailed {
                    user_id: user_id.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }
}
