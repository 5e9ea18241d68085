//! Request and response bodies of the management API

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Set of profiles, apps and users applied to devices that match `apply_at`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Blueprint {
    pub uuid: String,
    pub name: String,
    pub application_urls: Vec<String>,
    pub profile_ids: Vec<String>,
    pub user_uuids: Vec<String>,
    pub skip_primary_setup_account_creation: bool,
    pub set_primary_setup_account_as_regular_user: bool,
    /// Trigger events, e.g. `Enroll`
    pub apply_at: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintRequest {
    pub blueprint: Blueprint,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintResponse {}

/// Encrypted DEP server token as downloaded from Apple, PEM/S-MIME text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepTokensRequest {
    pub p7m_content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepTokensResponse {}

/// Enrollment profile assigned to DEP devices
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepProfile {
    pub profile_name: String,
    pub url: String,
    pub allow_pairing: bool,
    pub is_supervised: bool,
    pub is_multi_user: bool,
    pub is_mandatory: bool,
    pub await_device_configured: bool,
    pub is_mdm_removable: bool,
    pub support_phone_number: String,
    pub support_email_address: String,
    pub org_magic: String,
    pub department: String,
    pub skip_setup_items: Vec<String>,
    pub devices: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepProfileRequest {
    pub profile: DepProfile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DepProfileResponse {
    pub profile_uuid: String,
    /// Serial number -> assignment status
    pub devices: HashMap<String, String>,
}

/// App package upload, carried as multipart form data
///
/// Either half may be absent. An empty name means that half is not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppUploadRequest {
    pub manifest_name: String,
    pub manifest_file: Option<Bytes>,
    pub pkg_filename: String,
    pub pkg_file: Option<Bytes>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppUploadResponse {}

/// Local user account created on a device during setup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub uuid: String,
    pub udid: String,
    pub user_shortname: String,
    pub user_longname: String,
    pub password_hash: String,
    pub hidden: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRequest {
    pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeviceRequest {
    pub udid: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDeviceResponse {}
