//! HTTP behaviour of the remote collaborators against a local server.
//!
//! Each test binds a `warp` server on an ephemeral port and points a client
//! at it, so wire format and status handling are checked end to end.

use bloodwise_core::{
    AppConfig, AuthContext, AuthError, AuthProvider, AuthSession, BackendConfig, Confidence,
    Identity, InferenceConfig, Measurement, NotificationLevel, NotificationLog, PersistenceError,
    PersistenceOutcome, PredictionError, PredictionRecord, PredictionResult, PredictionService,
    PredictionStore, ScanForm, ScanSession, ServiceFailureKind, SignUpOutcome, Tone, UserId,
    ValidatedMeasurement,
};
use bloodwise_remote::{InferenceClient, RemoteServices, SupabaseAuth, SupabaseStore};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use warp::filters::BoxedFilter;
use warp::http::{HeaderMap, StatusCode};
use warp::hyper::body::Bytes;
use warp::reply::Response;
use warp::{Filter, Reply};

const USER_ID: &str = "7f1c4c5e-2b7e-4a53-9a8e-4c8d2d1e0b11";

#[derive(Debug, Clone)]
struct Captured {
    headers: HeaderMap,
    body: String,
}

type Log = Arc<Mutex<Vec<Captured>>>;

fn serve(routes: BoxedFilter<(Response,)>) -> String {
    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    format!("http://{addr}")
}

/// POST route that records the request and answers with a fixed status/body
fn capture(
    path: &'static str,
    log: Log,
    status: StatusCode,
    body: &'static str,
) -> BoxedFilter<(Response,)> {
    warp::post()
        .and(warp::path(path))
        .and(warp::path::end())
        .and(warp::header::headers_cloned())
        .and(warp::body::bytes())
        .map(move |headers: HeaderMap, bytes: Bytes| {
            log.lock().push(Captured {
                headers,
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
            warp::reply::with_status(
                warp::reply::with_header(body, "content-type", "application/json"),
                status,
            )
            .into_response()
        })
        .boxed()
}

fn inference_config(base_url: String) -> InferenceConfig {
    InferenceConfig {
        base_url,
        timeout_ms: 2_000,
    }
}

fn backend_config(url: String) -> BackendConfig {
    BackendConfig {
        url,
        anon_key: Some("anon-key".into()),
    }
}

fn measurement() -> ValidatedMeasurement {
    let mut form = ScanForm::new();
    form.set(Measurement::Hemoglobin, "14.2");
    form.set(Measurement::Mch, "28.5");
    form.set(Measurement::Mchc, "32.5");
    form.set(Measurement::Mcv, "88.5");
    form.validate().unwrap()
}

fn auth_session() -> AuthSession {
    AuthSession::new(
        Identity::new(USER_ID.parse().unwrap(), "a@example.com"),
        "user-token",
    )
}

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

#[tokio::test]
async fn predict_sends_exact_body_and_decodes_result() {
    let log = Log::default();
    let base = serve(capture(
        "predict",
        log.clone(),
        StatusCode::OK,
        r#"{"prediction":"Healthy","confidence":0.92}"#,
    ));
    let client = InferenceClient::new(&inference_config(format!("{base}/"))).unwrap();
    assert_eq!(client.endpoint(), format!("{base}/predict"));

    let result = client.predict(&measurement()).await.unwrap();

    assert_eq!(
        result,
        PredictionResult::new("Healthy").with_confidence(Confidence::Fraction(0.92))
    );
    let seen = log.lock().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(
        seen[0].body,
        r#"{"Hemoglobin":14.2,"Mean_Corpuscular_Hemoglobin":28.5,"Mean_Corpuscular_Hemoglobin_Concentration":32.5,"Mean_Corpuscular_Volume":88.5}"#
    );
    assert_eq!(seen[0].headers["content-type"], "application/json");
    assert_eq!(seen[0].headers["accept"], "application/json");
}

#[tokio::test]
async fn predict_classifies_error_statuses() {
    for (status, kind) in [
        (StatusCode::NOT_FOUND, ServiceFailureKind::NotFound),
        (StatusCode::INTERNAL_SERVER_ERROR, ServiceFailureKind::ServerProcessing),
        (StatusCode::UNPROCESSABLE_ENTITY, ServiceFailureKind::Other),
    ] {
        let base = serve(capture("predict", Log::default(), status, "model exploded"));
        let client = InferenceClient::new(&inference_config(base)).unwrap();

        let err = client.predict(&measurement()).await.unwrap_err();
        assert_eq!(err.service_kind(), Some(kind), "{status}");
        match err {
            PredictionError::Service { status: code, body } => {
                assert_eq!(code, status.as_u16());
                assert_eq!(body, "model exploded");
            }
            other => panic!("expected Service error, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn predict_rejects_undecodable_body() {
    let base = serve(capture("predict", Log::default(), StatusCode::OK, "<html>ok</html>"));
    let client = InferenceClient::new(&inference_config(base)).unwrap();

    let err = client.predict(&measurement()).await.unwrap_err();
    assert!(matches!(err, PredictionError::MalformedResponse(_)), "{err:?}");
}

#[tokio::test]
async fn predict_times_out() {
    let slow = warp::post()
        .and(warp::path("predict"))
        .and_then(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok::<_, warp::Rejection>(warp::reply::json(&"late").into_response())
        })
        .boxed();
    let base = serve(slow);
    let client = InferenceClient::new(&InferenceConfig {
        base_url: base,
        timeout_ms: 200,
    })
    .unwrap();

    let err = client.predict(&measurement()).await.unwrap_err();
    assert_eq!(err, PredictionError::TimedOut { after_ms: 200 });
}

#[tokio::test]
async fn predict_unreachable_is_transport_failure() {
    let client = InferenceClient::new(&inference_config("http://127.0.0.1:1".into())).unwrap();

    let err = client.predict(&measurement()).await.unwrap_err();
    assert!(matches!(err, PredictionError::Transport(_)), "{err:?}");
    assert_eq!(err.user_message(), "Network error: Unable to connect to analysis server");
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

fn store_route(log: Log, status: StatusCode, body: &'static str) -> BoxedFilter<(Response,)> {
    warp::path("rest")
        .and(warp::path("v1"))
        .and(capture("predictions", log, status, body))
        .boxed()
}

#[tokio::test]
async fn insert_posts_one_row_as_the_user() {
    let log = Log::default();
    let base = serve(store_route(log.clone(), StatusCode::CREATED, ""));
    let store = SupabaseStore::new(&backend_config(base.clone()), Duration::from_secs(2)).unwrap();
    assert_eq!(store.endpoint(), format!("{base}/rest/v1/predictions"));

    let session = auth_session();
    let result = PredictionResult::new("Anemic").with_confidence(Confidence::Fraction(0.81));
    let record = PredictionRecord::new(&session.identity, &measurement(), &result);
    store.insert(&session, &record).await.unwrap();

    let seen = log.lock().clone();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].headers["apikey"], "anon-key");
    assert_eq!(seen[0].headers["authorization"], "Bearer user-token");
    assert_eq!(seen[0].headers["prefer"], "return=minimal");

    let rows: Vec<serde_json::Value> = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["user_id"], USER_ID);
    assert_eq!(rows[0]["hemoglobin"], 14.2);
    assert_eq!(rows[0]["mcv"], 88.5);
    assert_eq!(rows[0]["prediction_result"], "Anemic");
    assert_eq!(rows[0]["confidence_score"], 0.81);
    assert!(rows[0]["created_at"].is_string());
}

#[tokio::test]
async fn insert_rejection_is_reported() {
    let base = serve(store_route(
        Log::default(),
        StatusCode::UNAUTHORIZED,
        r#"{"message":"JWT expired"}"#,
    ));
    let store = SupabaseStore::new(&backend_config(base), Duration::from_secs(2)).unwrap();
    let session = auth_session();
    let record = PredictionRecord::new(&session.identity, &measurement(), &PredictionResult::new("Healthy"));

    let err = store.insert(&session, &record).await.unwrap_err();
    assert_eq!(
        err,
        PersistenceError::Rejected {
            status: 401,
            body: r#"{"message":"JWT expired"}"#.into()
        }
    );
}

#[test]
fn store_requires_anon_key() {
    let config = BackendConfig {
        url: "http://localhost".into(),
        anon_key: None,
    };
    assert!(SupabaseStore::new(&config, Duration::from_secs(1)).is_err());
    assert!(SupabaseAuth::new(&config, Duration::from_secs(1)).is_err());
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

fn auth_routes(log: Log) -> BoxedFilter<(Response,)> {
    let token = {
        let log = log.clone();
        warp::post()
            .and(warp::path!("auth" / "v1" / "token"))
            .and(warp::query::<HashMap<String, String>>())
            .and(warp::body::json())
            .map(move |query: HashMap<String, String>, body: serde_json::Value| {
                log.lock().push(Captured {
                    headers: HeaderMap::new(),
                    body: body.to_string(),
                });
                assert_eq!(query.get("grant_type").map(String::as_str), Some("password"));
                if body["password"] == "right" {
                    warp::reply::json(&serde_json::json!({
                        "access_token": "fresh-token",
                        "token_type": "bearer",
                        "user": {"id": USER_ID, "email": body["email"]}
                    }))
                    .into_response()
                } else {
                    warp::reply::with_status(
                        warp::reply::json(&serde_json::json!({
                            "error": "invalid_grant",
                            "error_description": "Invalid login credentials"
                        })),
                        StatusCode::BAD_REQUEST,
                    )
                    .into_response()
                }
            })
    };
    let signup = warp::post()
        .and(warp::path!("auth" / "v1" / "signup"))
        .map(|| {
            warp::reply::json(&serde_json::json!({"id": USER_ID, "email": "new@example.com"}))
                .into_response()
        });
    let logout = warp::post()
        .and(warp::path!("auth" / "v1" / "logout"))
        .and(warp::header::headers_cloned())
        .map(move |headers: HeaderMap| {
            log.lock().push(Captured {
                headers,
                body: String::new(),
            });
            StatusCode::NO_CONTENT.into_response()
        });
    token.or(signup).unify().or(logout).unify().boxed()
}

#[tokio::test]
async fn sign_in_and_out_round_trip() {
    let log = Log::default();
    let base = serve(auth_routes(log.clone()));
    let provider = SupabaseAuth::new(&backend_config(base), Duration::from_secs(2)).unwrap();
    let auth = AuthContext::new(Arc::new(provider));

    let identity = auth.sign_in("a@example.com", "right").await.unwrap();
    assert_eq!(identity.id, USER_ID.parse::<UserId>().unwrap());
    assert_eq!(auth.current_session().unwrap().access_token, "fresh-token");

    auth.sign_out().await.unwrap();
    assert!(!auth.is_signed_in());

    let seen = log.lock().clone();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].headers["authorization"], "Bearer fresh-token");
    assert_eq!(seen[1].headers["apikey"], "anon-key");
}

#[tokio::test]
async fn sign_in_with_wrong_password_is_rejected() {
    let base = serve(auth_routes(Log::default()));
    let provider = SupabaseAuth::new(&backend_config(base), Duration::from_secs(2)).unwrap();

    let err = provider.sign_in("a@example.com", "wrong").await.unwrap_err();
    assert_eq!(
        err,
        AuthError::Rejected {
            status: 400,
            message: "Invalid login credentials".into()
        }
    );
}

#[tokio::test]
async fn sign_up_pending_confirmation() {
    let base = serve(auth_routes(Log::default()));
    let provider = SupabaseAuth::new(&backend_config(base), Duration::from_secs(2)).unwrap();

    let outcome = provider.sign_up("new@example.com", "pw").await.unwrap();
    match outcome {
        SignUpOutcome::ConfirmationRequired(identity) => {
            assert_eq!(identity.email, "new@example.com");
        }
        other => panic!("expected ConfirmationRequired, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Whole flow over HTTP
// ---------------------------------------------------------------------------

#[tokio::test]
async fn scan_over_http_with_failing_store() {
    let predict_log = Log::default();
    let routes = capture(
        "predict",
        predict_log.clone(),
        StatusCode::OK,
        r#"{"prediction":"Anemic","confidence":"87%"}"#,
    )
    .or(store_route(Log::default(), StatusCode::FORBIDDEN, "rls"))
    .unify()
    .boxed();
    let base = serve(routes);

    let config = AppConfig::new()
        .with_api_url(base.clone())
        .with_backend(base, "anon-key");
    let services = RemoteServices::from_config(&config).unwrap();
    let auth = Arc::new(AuthContext::with_session(services.auth.clone(), auth_session()));
    let log = Arc::new(NotificationLog::new());
    let session = ScanSession::new(auth, services.predictor, services.store, log.clone());

    session.set_field(Measurement::Hemoglobin, "9.1");
    session.set_field(Measurement::Mch, "22");
    session.set_field(Measurement::Mchc, "30");
    session.set_field(Measurement::Mcv, "70");
    let report = session.submit().await;

    assert!(report.prediction().is_some());
    assert!(matches!(
        report.persistence,
        PersistenceOutcome::Failed(PersistenceError::Rejected { status: 403, .. })
    ));
    let view = session.presented().unwrap();
    assert_eq!(view.tone(), Tone::Attention);
    assert_eq!(view.confidence.as_deref(), Some("87%"));
    assert_eq!(log.count(NotificationLevel::Warning), 1);
    assert_eq!(predict_log.lock().len(), 1);
}
