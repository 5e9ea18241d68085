//! Axum router for the management API

use crate::error::ApplyError;
use crate::service::ApplyService;
use crate::transport::{decode_app_upload_request, decode_block_device_request, decode_json_request};
use crate::types::*;
use axum::extract::{Multipart, Path, State};
use axum::routing::{post, put};
use axum::{Json, Router};
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

type SharedService = Arc<dyn ApplyService>;

pub fn make_router(service: SharedService) -> Router {
    Router::new()
        .route("/v1/blueprints", post(apply_blueprint))
        .route("/v1/dep-tokens", put(apply_dep_tokens))
        .route("/v1/dep/profiles", post(define_dep_profile))
        .route("/v1/apps", post(upload_app))
        .route("/v1/users", post(apply_user))
        .route("/v1/devices/{udid}/block", post(block_device))
        .with_state(service)
}

async fn apply_blueprint(
    State(svc): State<SharedService>,
    body: Bytes,
) -> Result<Json<BlueprintResponse>, ApplyError> {
    let request: BlueprintRequest = decode_json_request(&body)?;
    let name = request.blueprint.name.clone();
    svc.apply_blueprint(request.blueprint).await?;
    info!(%name, "Blueprint applied");
    Ok(Json(BlueprintResponse {}))
}

async fn apply_dep_tokens(
    State(svc): State<SharedService>,
    body: Bytes,
) -> Result<Json<DepTokensResponse>, ApplyError> {
    let request: DepTokensRequest = decode_json_request(&body)?;
    svc.apply_dep_tokens(request.p7m_content).await?;
    info!("DEP tokens applied");
    Ok(Json(DepTokensResponse {}))
}

async fn define_dep_profile(
    State(svc): State<SharedService>,
    body: Bytes,
) -> Result<Json<DepProfileResponse>, ApplyError> {
    let request: DepProfileRequest = decode_json_request(&body)?;
    Ok(Json(svc.define_dep_profile(request.profile).await?))
}

async fn upload_app(
    State(svc): State<SharedService>,
    multipart: Multipart,
) -> Result<Json<AppUploadResponse>, ApplyError> {
    let request = decode_app_upload_request(multipart).await?;
    info!(
        manifest = %request.manifest_name,
        pkg = %request.pkg_filename,
        "App upload received"
    );
    svc.upload_app(request).await?;
    Ok(Json(AppUploadResponse {}))
}

async fn apply_user(
    State(svc): State<SharedService>,
    body: Bytes,
) -> Result<Json<UserResponse>, ApplyError> {
    let request: UserRequest = decode_json_request(&body)?;
    let user = svc.apply_user(request.user).await?;
    Ok(Json(UserResponse { user }))
}

async fn block_device(
    State(svc): State<SharedService>,
    Path(params): Path<HashMap<String, String>>,
) -> Result<Json<BlockDeviceResponse>, ApplyError> {
    let request = decode_block_device_request(&params)?;
    info!(udid = %request.udid, "Blocking device");
    svc.block_device(request.udid).await?;
    Ok(Json(BlockDeviceResponse {}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{decode_response, encode_block_device_request, encode_json_request, encode_upload_app_request};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::response::Response;
    use std::sync::Mutex;
    use tower::ServiceExt;

    /// Records every call; fails with `error` when set
    #[derive(Default)]
    struct FakeService {
        calls: Mutex<Vec<String>>,
        uploads: Mutex<Vec<AppUploadRequest>>,
        error: Option<ApplyError>,
    }

    impl FakeService {
        fn failing(error: ApplyError) -> Self {
            Self {
                error: Some(error),
                ..Default::default()
            }
        }

        fn record(&self, call: String) -> Result<(), ApplyError> {
            self.calls.lock().unwrap().push(call);
            match &self.error {
                Some(e) => Err(e.clone()),
                None => Ok(()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ApplyService for FakeService {
        async fn apply_blueprint(&self, blueprint: Blueprint) -> Result<(), ApplyError> {
            self.record(format!("blueprint:{}", blueprint.name))
        }

        async fn apply_dep_tokens(&self, p7m_content: String) -> Result<(), ApplyError> {
            self.record(format!("tokens:{}", p7m_content.len()))
        }

        async fn define_dep_profile(&self, profile: DepProfile) -> Result<DepProfileResponse, ApplyError> {
            self.record(format!("profile:{}", profile.profile_name))?;
            Ok(DepProfileResponse {
                profile_uuid: "PROFILE-1".into(),
                devices: profile.devices.into_iter().map(|d| (d, "SUCCESS".to_string())).collect(),
            })
        }

        async fn upload_app(&self, upload: AppUploadRequest) -> Result<(), ApplyError> {
            self.uploads.lock().unwrap().push(upload);
            self.record("upload".into())
        }

        async fn apply_user(&self, user: User) -> Result<User, ApplyError> {
            self.record(format!("user:{}", user.user_shortname))?;
            Ok(User {
                uuid: "USER-1".into(),
                ..user
            })
        }

        async fn block_device(&self, udid: String) -> Result<(), ApplyError> {
            self.record(format!("block:{udid}"))
        }
    }

    async fn send(service: Arc<FakeService>, request: Request<Body>) -> Response {
        make_router(service).oneshot(request).await.unwrap()
    }

    async fn body_of(resp: Response) -> Bytes {
        axum::body::to_bytes(resp.into_body(), 1024 * 1024).await.unwrap()
    }

    #[tokio::test]
    async fn block_device_dispatches_udid() {
        let service = Arc::new(FakeService::default());
        let request = encode_block_device_request(&BlockDeviceRequest {
            udid: "UDID-1".into(),
        });

        let resp = send(service.clone(), request.into_request().unwrap()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(service.calls(), vec!["block:UDID-1".to_string()]);
    }

    #[tokio::test]
    async fn block_device_without_udid_has_no_side_effect() {
        let service = Arc::new(FakeService::default());

        for params in [HashMap::new(), HashMap::from([("udid".to_string(), String::new())])] {
            let shared: SharedService = service.clone();
            let result = block_device(State(shared), Path(params)).await;
            assert!(matches!(result, Err(ApplyError::BadRoute)));
        }

        // An empty segment is either unmatched or rejected as a bad route
        let request = Request::builder()
            .method("POST")
            .uri("/v1/devices//block")
            .body(Body::empty())
            .unwrap();
        let resp = send(service.clone(), request).await;
        assert!(matches!(resp.status(), StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST));

        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn malformed_json_never_reaches_service() {
        let service = Arc::new(FakeService::default());
        let request = Request::builder()
            .method("POST")
            .uri("/v1/blueprints")
            .header("content-type", "application/json")
            .body(Body::from("{\"blueprint\":"))
            .unwrap();

        let resp = send(service.clone(), request).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let err = decode_response::<BlueprintResponse>(StatusCode::BAD_REQUEST, &body_of(resp).await).unwrap_err();
        assert!(matches!(err, ApplyError::Decode(_)));
        assert!(service.calls().is_empty());
    }

    #[tokio::test]
    async fn service_error_maps_to_status() {
        let service = Arc::new(FakeService::failing(ApplyError::NotFound("no such user".into())));
        let request = encode_json_request(
            Method::POST,
            "/v1/users",
            &UserRequest {
                user: User {
                    user_shortname: "admin".into(),
                    ..Default::default()
                },
            },
        )
        .unwrap();

        let resp = send(service, request.into_request().unwrap()).await;
        let status = resp.status();
        assert_eq!(status, StatusCode::NOT_FOUND);

        let err = decode_response::<UserResponse>(status, &body_of(resp).await).unwrap_err();
        assert_eq!(err, ApplyError::NotFound("no such user".into()));
    }

    #[tokio::test]
    async fn dep_profile_round_trip() {
        let service = Arc::new(FakeService::default());
        let request = encode_json_request(
            Method::POST,
            "/v1/dep/profiles",
            &DepProfileRequest {
                profile: DepProfile {
                    profile_name: "lab".into(),
                    devices: vec!["C02X".into()],
                    ..Default::default()
                },
            },
        )
        .unwrap();

        let resp = send(service.clone(), request.into_request().unwrap()).await;
        let status = resp.status();
        let response: DepProfileResponse = decode_response(status, &body_of(resp).await).unwrap();

        assert_eq!(response.profile_uuid, "PROFILE-1");
        assert_eq!(response.devices.get("C02X").map(String::as_str), Some("SUCCESS"));
        assert_eq!(service.calls(), vec!["profile:lab".to_string()]);
    }

    #[tokio::test]
    async fn dep_tokens_require_put() {
        let service = Arc::new(FakeService::default());
        let body = DepTokensRequest {
            p7m_content: "-----BEGIN MESSAGE-----".into(),
        };

        let post = encode_json_request(Method::POST, "/v1/dep-tokens", &body).unwrap();
        let resp = send(service.clone(), post.into_request().unwrap()).await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);

        let put = encode_json_request(Method::PUT, "/v1/dep-tokens", &body).unwrap();
        let resp = send(service.clone(), put.into_request().unwrap()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(service.calls().len(), 1);
    }

    #[tokio::test]
    async fn upload_with_only_package() {
        let service = Arc::new(FakeService::default());
        let upload = AppUploadRequest {
            pkg_filename: "tool.pkg".into(),
            pkg_file: Some(Bytes::from_static(b"xar!pkgdata")),
            ..Default::default()
        };

        let request = encode_upload_app_request(&upload).into_request().unwrap();
        let resp = send(service.clone(), request).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let received = service.uploads.lock().unwrap().clone();
        assert_eq!(received, vec![upload]);
    }

    #[tokio::test]
    async fn upload_with_manifest_and_package() {
        let service = Arc::new(FakeService::default());
        let upload = AppUploadRequest {
            manifest_name: "tool.plist".into(),
            manifest_file: Some(Bytes::from_static(b"<plist/>")),
            pkg_filename: "tool.pkg".into(),
            pkg_file: Some(Bytes::from_static(b"xar!")),
        };

        let request = encode_upload_app_request(&upload).into_request().unwrap();
        let resp = send(service.clone(), request).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(service.uploads.lock().unwrap()[0], upload);
    }
}
