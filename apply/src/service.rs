use crate::error::ApplyError;
use crate::types::{AppUploadRequest, Blueprint, DepProfile, DepProfileResponse, User};
use async_trait::async_trait;

/// Management operations the HTTP layer dispatches to
#[async_trait]
pub trait ApplyService: Send + Sync {
    async fn apply_blueprint(&self, blueprint: Blueprint) -> Result<(), ApplyError>;

    async fn apply_dep_tokens(&self, p7m_content: String) -> Result<(), ApplyError>;

    async fn define_dep_profile(&self, profile: DepProfile) -> Result<DepProfileResponse, ApplyError>;

    async fn upload_app(&self, upload: AppUploadRequest) -> Result<(), ApplyError>;

    async fn apply_user(&self, user: User) -> Result<User, ApplyError>;

    /// Refuse further enrollment and commands for a device
    async fn block_device(&self, udid: String) -> Result<(), ApplyError>;
}
