//! Router-level tests exercising the HTTP surface end to end against a
//! local object store and an unconfigured datastore sink.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use tower::ServiceExt;

use filepipe_queue::{
    Dispatcher, DispatcherConfig, Job, JobStore, ObjectStoreSource, SnapshotStore,
};
use filepipe_storage::{FileStore, LocalBackend, StorageBackend};

use crate::db::PgSink;
use crate::router::build_router;
use crate::state::AppState;

const BOUNDARY: &str = "XFILEPIPEBOUNDARY";

fn test_state(tmp: &std::path::Path) -> Arc<AppState> {
    let backend = StorageBackend::Local(LocalBackend::new(tmp).unwrap());
    let files = Arc::new(FileStore::new(backend));
    let store = Arc::new(JobStore::open(SnapshotStore::new(tmp.join("job-state.json"))));
    let dispatcher = Dispatcher::new(
        store,
        Arc::new(ObjectStoreSource::new(files.clone())),
        Arc::new(PgSink::new(None)),
        DispatcherConfig {
            max_concurrent_jobs: 2,
            batch_size: 100,
            collection: "file_data".to_string(),
            temp_dir: tmp.join("temp"),
        },
    );
    Arc::new(AppState {
        dispatcher,
        files,
        max_file_size: 1024 * 1024,
    })
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn upload_request(file_name: &str, content: &str) -> Request<Body> {
    let body = format!(
        "--{b}\r\ncontent-disposition: form-data; name=\"file\"; filename=\"{name}\"\r\ncontent-type: application/octet-stream\r\n\r\n{content}\r\n--{b}--\r\n",
        b = BOUNDARY,
        name = file_name,
        content = content,
    );
    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn wait_terminal(state: &AppState, job_id: uuid::Uuid) -> Job {
    for _ in 0..400 {
        let job = state.dispatcher.store().get(job_id).unwrap();
        if job.status.is_terminal() {
            return job;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("job never reached a terminal state");
}

#[tokio::test]
async fn health_reports_healthy() {
    let tmp = tempfile::tempdir().unwrap();
    let app = build_router(test_state(tmp.path()));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
}

#[tokio::test]
async fn jobs_list_starts_empty() {
    let tmp = tempfile::tempdir().unwrap();
    let app = build_router(test_state(tmp.path()));

    let response = app
        .oneshot(Request::get("/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn unknown_job_is_404() {
    let tmp = tempfile::tempdir().unwrap();
    let app = build_router(test_state(tmp.path()));

    let uri = format!("/job/{}", uuid::Uuid::new_v4());
    let response = app
        .oneshot(Request::get(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("job not found"));
}

#[tokio::test]
async fn processing_a_missing_file_fails_the_job() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path());
    let app = build_router(state.clone());

    let response = app
        .oneshot(
            Request::post("/process/no-such-file")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    assert_eq!(json["status"], "queued");
    let job_id: uuid::Uuid = serde_json::from_value(json["jobId"].clone()).unwrap();

    let job = wait_terminal(&state, job_id).await;
    assert_eq!(job.status, filepipe_queue::JobStatus::Failed);
    assert!(job.error_message.as_deref().unwrap().contains("not found"));
}

#[tokio::test]
async fn upload_then_status_flow() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path());
    let app = build_router(state.clone());

    // Blank-only file: the pipeline finishes without a single bulk write,
    // so the job completes even with the datastore unconfigured.
    let response = app
        .clone()
        .oneshot(upload_request("blank.txt", "\n\n   \n"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let upload = body_json(response).await;
    assert_eq!(upload["success"], true);
    assert_eq!(upload["fileName"], "blank.txt");
    let file_id = upload["fileId"].as_str().unwrap().to_string();
    assert!(state.files.exists(&file_id).await.unwrap());

    let uri = format!("/process/{}?fileName=blank.txt", file_id);
    let response = app
        .clone()
        .oneshot(Request::post(uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = body_json(response).await;
    let job_id: uuid::Uuid = serde_json::from_value(json["jobId"].clone()).unwrap();

    let job = wait_terminal(&state, job_id).await;
    assert_eq!(job.status, filepipe_queue::JobStatus::Completed);
    assert_eq!(job.progress, 100);
    assert_eq!(job.lines_processed, 0);
    assert_eq!(job.file_name, "blank.txt");

    // Full snapshot over HTTP
    let job_uri = format!("/job/{}", job_id);
    let response = app
        .clone()
        .oneshot(Request::get(job_uri.as_str()).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "completed");
    assert_eq!(json["fileName"], "blank.txt");

    // Summary listing includes the job
    let response = app
        .oneshot(Request::get("/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let json = body_json(response).await;
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["status"], "completed");
    assert_eq!(list[0]["errorCount"], 0);
}

#[tokio::test]
async fn unconfigured_datastore_surfaces_as_job_failure() {
    let tmp = tempfile::tempdir().unwrap();
    let state = test_state(tmp.path());
    let app = build_router(state.clone());

    let response = app
        .clone()
        .oneshot(upload_request("events.jsonl", "{\"a\":1}\n"))
        .await
        .unwrap();
    let file_id = body_json(response).await["fileId"]
        .as_str()
        .unwrap()
        .to_string();

    let process_uri = format!("/process/{}", file_id);
    let response = app
        .oneshot(
            Request::post(process_uri.as_str())
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let job_id: uuid::Uuid =
        serde_json::from_value(body_json(response).await["jobId"].clone()).unwrap();

    let job = wait_terminal(&state, job_id).await;
    assert_eq!(job.status, filepipe_queue::JobStatus::Failed);
    assert!(job
        .error_message
        .as_deref()
        .unwrap()
        .contains("not configured"));
}

#[tokio::test]
async fn empty_multipart_is_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let app = build_router(test_state(tmp.path()));

    let body = format!("--{b}--\r\n", b = BOUNDARY);
    let response = app
        .oneshot(
            Request::post("/upload")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("no file provided"));
}
