//! Request decoders for the server side and request encoders for clients

use crate::error::{ApplyError, ErrorBody};
use crate::types::{AppUploadRequest, BlockDeviceRequest};
use axum::body::Body;
use axum::extract::Multipart;
use axum::http::{header, Method, Request, StatusCode};
use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// Path variable naming the device in `/v1/devices/{udid}/block`
pub const UDID_PARAM: &str = "udid";

pub const APPS_PATH: &str = "/v1/apps";

const MANIFEST_FILE_FIELD: &str = "app_manifest_filedata";
const MANIFEST_NAME_FIELD: &str = "app_manifest_filename";
const PKG_FILE_FIELD: &str = "pkg_filedata";
const PKG_NAME_FIELD: &str = "pkg_name";

/// Read the device id from matched path variables
pub fn decode_block_device_request(
    params: &HashMap<String, String>,
) -> Result<BlockDeviceRequest, ApplyError> {
    match params.get(UDID_PARAM) {
        Some(udid) if !udid.is_empty() => Ok(BlockDeviceRequest { udid: udid.clone() }),
        _ => Err(ApplyError::BadRoute),
    }
}

pub fn decode_json_request<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApplyError> {
    serde_json::from_slice(body).map_err(|e| ApplyError::Decode(format!("decode request: {e}")))
}

/// Collect the manifest and package halves of an app upload
///
/// Missing file parts leave the corresponding field `None`; unknown fields are
/// skipped.
pub async fn decode_app_upload_request(mut multipart: Multipart) -> Result<AppUploadRequest, ApplyError> {
    let mut request = AppUploadRequest::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApplyError::Decode(format!("read multipart: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            MANIFEST_NAME_FIELD => request.manifest_name = field.text().await.map_err(multipart_error(&name))?,
            MANIFEST_FILE_FIELD => request.manifest_file = Some(field.bytes().await.map_err(multipart_error(&name))?),
            PKG_NAME_FIELD => request.pkg_filename = field.text().await.map_err(multipart_error(&name))?,
            PKG_FILE_FIELD => request.pkg_file = Some(field.bytes().await.map_err(multipart_error(&name))?),
            _ => {}
        }
    }

    Ok(request)
}

fn multipart_error(field: &str) -> impl FnOnce(axum::extract::multipart::MultipartError) -> ApplyError + '_ {
    move |e| ApplyError::Decode(format!("{field}: {e}"))
}

/// A request ready to be sent by an HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRequest {
    pub method: Method,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl EncodedRequest {
    pub fn into_request(self) -> Result<Request<Body>, ApplyError> {
        let mut builder = Request::builder().method(self.method).uri(self.path);
        if let Some(content_type) = self.content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        builder
            .body(Body::from(self.body))
            .map_err(|e| ApplyError::Internal(format!("build request: {e}")))
    }
}

/// Encode an app upload as `multipart/form-data`
///
/// The manifest file part and its name field are written only when a
/// manifest name is set, and likewise for the package.
pub fn encode_upload_app_request(request: &AppUploadRequest) -> EncodedRequest {
    let boundary = Uuid::new_v4().simple().to_string();
    let mut body = BytesMut::new();

    if !request.manifest_name.is_empty() {
        write_file_part(
            &mut body,
            &boundary,
            MANIFEST_FILE_FIELD,
            &request.manifest_name,
            request.manifest_file.as_deref().unwrap_or_default(),
        );
        write_field(&mut body, &boundary, MANIFEST_NAME_FIELD, &request.manifest_name);
    }

    if !request.pkg_filename.is_empty() {
        write_file_part(
            &mut body,
            &boundary,
            PKG_FILE_FIELD,
            &request.pkg_filename,
            request.pkg_file.as_deref().unwrap_or_default(),
        );
        write_field(&mut body, &boundary, PKG_NAME_FIELD, &request.pkg_filename);
    }

    body.put_slice(format!("--{boundary}--\r\n").as_bytes());

    EncodedRequest {
        method: Method::POST,
        path: APPS_PATH.to_string(),
        content_type: Some(format!("multipart/form-data; boundary={boundary}")),
        body: body.freeze(),
    }
}

fn write_file_part(body: &mut BytesMut, boundary: &str, field: &str, filename: &str, data: &[u8]) {
    body.put_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            escape_quotes(field),
            escape_quotes(filename)
        )
        .as_bytes(),
    );
    body.put_slice(data);
    body.put_slice(b"\r\n");
}

fn write_field(body: &mut BytesMut, boundary: &str, field: &str, value: &str) {
    body.put_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{value}\r\n",
            escape_quotes(field)
        )
        .as_bytes(),
    );
}

fn escape_quotes(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// `POST /v1/devices/{udid}/block` with the device id query-escaped
pub fn encode_block_device_request(request: &BlockDeviceRequest) -> EncodedRequest {
    let udid: String = url::form_urlencoded::byte_serialize(request.udid.as_bytes()).collect();
    EncodedRequest {
        method: Method::POST,
        path: format!("/v1/devices/{udid}/block"),
        content_type: None,
        body: Bytes::new(),
    }
}

pub fn encode_json_request<T: Serialize>(
    method: Method,
    path: &str,
    request: &T,
) -> Result<EncodedRequest, ApplyError> {
    let body = serde_json::to_vec(request).map_err(|e| ApplyError::Internal(format!("encode request: {e}")))?;
    Ok(EncodedRequest {
        method,
        path: path.to_string(),
        content_type: Some("application/json".to_string()),
        body: Bytes::from(body),
    })
}

/// Decode a response body, turning any non-200 status into its error
pub fn decode_response<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ApplyError> {
    if status != StatusCode::OK {
        let error: ErrorBody = serde_json::from_slice(body)
            .map_err(|e| ApplyError::Decode(format!("status {status}, unreadable error body: {e}")))?;
        return Err(error.into());
    }

    serde_json::from_slice(body).map_err(|e| ApplyError::Decode(format!("decode response: {e}")))
}
