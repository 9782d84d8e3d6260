//! Exercises `GithubContentsClient` against an in-process fake of the
//! Contents API that assigns blob SHAs and rejects stale writes.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use github::{GithubClientConfig, GithubContentsClient};
use proxy::{
    AccessToken, BlobSha, BranchName, CommitMessage, ContentsStore, FilePath, PutFile,
    RepositoryName, RepositoryOwner, RepositoryTarget, SyncError, SyncProxy, SyncSettings,
    Timestamp,
};
use serde_json::{json, Value};

const TOKEN: &str = "test-token";

#[derive(Default)]
struct FakeRepo {
    files: HashMap<String, (String, Vec<u8>)>,
    version: u64,
    user_agents: Vec<String>,
    /// Paths served the way GitHub serves files over 1 MB: no inline content.
    large: HashSet<String>,
}

type Shared = Arc<Mutex<FakeRepo>>;

fn error(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({"message": message, "documentation_url": "https://docs.github.com/rest"})),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn read_contents(
    State(repo): State<Shared>,
    Path((owner, name, path)): Path<(String, String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    assert_eq!((owner.as_str(), name.as_str()), ("rubendml", "numismatica"));
    assert_eq!(query.get("ref").map(String::as_str), Some("main"));
    assert_eq!(
        headers.get("x-github-api-version").and_then(|v| v.to_str().ok()),
        Some("2022-11-28")
    );

    let mut repo = repo.lock().unwrap();
    if let Some(agent) = headers.get("user-agent").and_then(|v| v.to_str().ok()) {
        repo.user_agents.push(agent.to_string());
    }
    if path == "data" {
        return Json(json!([{"type": "file", "name": "coleccion.json"}])).into_response();
    }
    if path == "outage.json" {
        return (StatusCode::SERVICE_UNAVAILABLE, "upstream down").into_response();
    }
    match repo.files.get(&path) {
        Some((sha, _)) if repo.large.contains(&path) => Json(json!({
            "type": "file",
            "encoding": "none",
            "path": path,
            "sha": sha,
            "content": "",
        }))
        .into_response(),
        Some((sha, bytes)) => {
            // GitHub wraps base64 content at 60 columns.
            let encoded = STANDARD.encode(bytes);
            let wrapped = encoded
                .as_bytes()
                .chunks(60)
                .map(|c| std::str::from_utf8(c).unwrap())
                .collect::<Vec<_>>()
                .join("\n");
            Json(json!({
                "type": "file",
                "encoding": "base64",
                "path": path,
                "sha": sha,
                "content": format!("{wrapped}\n"),
            }))
            .into_response()
        }
        None => error(StatusCode::NOT_FOUND, "Not Found"),
    }
}

async fn write_contents(
    State(repo): State<Shared>,
    Path((_owner, _name, path)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return error(StatusCode::UNAUTHORIZED, "Bad credentials");
    }
    assert_eq!(body["branch"], "main");
    let mut repo = repo.lock().unwrap();
    let current = repo.files.get(&path).map(|(sha, _)| sha.clone());
    let supplied = body.get("sha").and_then(Value::as_str).map(str::to_string);
    match (&current, &supplied) {
        (Some(current), Some(supplied)) if current != supplied => {
            return error(
                StatusCode::CONFLICT,
                &format!("{path} does not match {supplied}"),
            );
        }
        (Some(_), None) => {
            return error(
                StatusCode::UNPROCESSABLE_ENTITY,
                "Invalid request.\n\n\"sha\" wasn't supplied.",
            );
        }
        _ => {}
    }

    let bytes = STANDARD
        .decode(body["content"].as_str().unwrap())
        .unwrap();
    repo.version += 1;
    let sha = format!("{:040x}", repo.version);
    repo.files.insert(path.clone(), (sha.clone(), bytes));
    let status = if current.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    (
        status,
        Json(json!({
            "content": {"path": path, "sha": sha},
            "commit": {
                "sha": format!("c{:039x}", repo.version),
                "message": body["message"],
                "html_url": format!("https://github.com/rubendml/numismatica/commit/{}", repo.version),
            }
        })),
    )
        .into_response()
}

async fn spawn_fake_github() -> (String, Shared) {
    let repo: Shared = Arc::default();
    let app = Router::new()
        .route(
            "/repos/{owner}/{repo}/contents/{*path}",
            get(read_contents).put(write_contents),
        )
        .with_state(repo.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}"), repo)
}

fn client(api_base: &str) -> GithubContentsClient {
    GithubContentsClient::new(GithubClientConfig {
        api_base: api_base.to_string(),
        user_agent: "sync-proxy-test".to_string(),
        timeout: Duration::from_secs(5),
        target: RepositoryTarget {
            owner: RepositoryOwner::new("rubendml").unwrap(),
            repo: RepositoryName::new("numismatica").unwrap(),
            branch: BranchName::new("main").unwrap(),
        },
    })
    .unwrap()
}

fn token() -> AccessToken {
    AccessToken::new(TOKEN).unwrap()
}

fn path(p: &str) -> FilePath {
    FilePath::new(p).unwrap()
}

fn proxy(api_base: &str) -> SyncProxy {
    SyncProxy::new(
        Arc::new(client(api_base)),
        Some(token()),
        SyncSettings {
            default_path: path("data/coleccion.json"),
            commit_message_prefix: "Automatic sync".into(),
            token_setting: "GITHUB_TOKEN".into(),
        },
    )
}

fn put(p: &str, content: &[u8], sha: Option<BlobSha>) -> PutFile {
    PutFile {
        path: path(p),
        content: content.to_vec(),
        sha,
        message: CommitMessage::automatic("test", Timestamp::now()),
    }
}

#[tokio::test]
async fn save_then_fetch_round_trips_through_github() {
    let (base, _repo) = spawn_fake_github().await;
    let proxy = proxy(&base);
    // Large enough that the fake wraps the base64 over several lines.
    let doc = json!({
        "coins": (0..50).map(|i| json!({"id": i, "name": format!("Peseta {i}")})).collect::<Vec<_>>()
    });

    let first = proxy.save_file(&path("data/coleccion.json"), &doc).await.unwrap();
    let second = proxy
        .save_file(&path("data/coleccion.json"), &json!({"coins": []}))
        .await
        .unwrap();
    let fetched = proxy.fetch_file(&path("data/coleccion.json")).await.unwrap();

    assert_ne!(first.sha, second.sha);
    assert!(first.message.starts_with("Automatic sync - "));
    assert!(first.html_url.is_some());
    assert_eq!(fetched.content, json!({"coins": []}));
}

#[tokio::test]
async fn creation_sends_no_sha_and_update_sends_current_sha() {
    let (base, repo) = spawn_fake_github().await;
    let c = client(&base);

    c.put_file(&token(), &put("a.json", b"{}", None)).await.unwrap();
    let current = c.get_file(&token(), &path("a.json")).await.unwrap();
    c.put_file(&token(), &put("a.json", b"[]", Some(current.sha)))
        .await
        .unwrap();

    let repo = repo.lock().unwrap();
    assert_eq!(repo.files["a.json"].1, b"[]".to_vec());
    assert!(repo.user_agents.iter().all(|ua| ua == "sync-proxy-test"));
}

#[tokio::test]
async fn missing_file_passes_through_404() {
    let (base, _repo) = spawn_fake_github().await;

    let err = proxy(&base)
        .fetch_file(&path("missing.json"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SyncError::Backend {
            status: 404,
            message: "Not Found".into()
        }
    );
}

#[tokio::test]
async fn stale_sha_is_rejected_with_conflict() {
    let (base, _repo) = spawn_fake_github().await;
    let c = client(&base);
    c.put_file(&token(), &put("race.json", b"{}", None)).await.unwrap();
    let observed = c.get_file(&token(), &path("race.json")).await.unwrap();

    // Two writers saw the same version; the first one wins.
    c.put_file(&token(), &put("race.json", b"[1]", Some(observed.sha.clone())))
        .await
        .unwrap();
    let err = c
        .put_file(&token(), &put("race.json", b"[2]", Some(observed.sha)))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 409);
    let winner = c.get_file(&token(), &path("race.json")).await.unwrap();
    assert_eq!(winner.content, b"[1]".to_vec());
}

#[tokio::test]
async fn bad_credentials_pass_through() {
    let (base, _repo) = spawn_fake_github().await;
    let wrong = AccessToken::new("nope").unwrap();

    let err = client(&base)
        .get_file(&wrong, &path("a.json"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SyncError::Backend {
            status: 401,
            message: "Bad credentials".into()
        }
    );
}

#[tokio::test]
async fn plain_text_error_body_is_passed_through() {
    let (base, _repo) = spawn_fake_github().await;

    let err = client(&base)
        .get_file(&token(), &path("outage.json"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        SyncError::Backend {
            status: 503,
            message: "upstream down".into()
        }
    );
}

#[tokio::test]
async fn directory_listing_is_a_bad_request() {
    let (base, _repo) = spawn_fake_github().await;

    let err = client(&base)
        .get_file(&token(), &path("data"))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn unreachable_backend_is_internal_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{addr}"))
        .get_file(&token(), &path("a.json"))
        .await
        .unwrap_err();

    assert!(matches!(err, SyncError::Internal { .. }));
    assert_eq!(err.client_message(), "Internal server error");
}

#[tokio::test]
async fn save_over_large_file_uses_its_sha_without_decoding() {
    let (base, repo) = spawn_fake_github().await;
    {
        let mut repo = repo.lock().unwrap();
        repo.files
            .insert("data/big.json".into(), ("abc".into(), b"{}".to_vec()));
        repo.large.insert("data/big.json".into());
    }

    let commit = proxy(&base)
        .save_file(&path("data/big.json"), &json!({"coins": [1]}))
        .await
        .unwrap();

    assert!(commit.message.starts_with("Automatic sync - "));
    let repo = repo.lock().unwrap();
    let (sha, bytes) = &repo.files["data/big.json"];
    assert_ne!(sha, "abc");
    assert_eq!(bytes, &b"{\n  \"coins\": [\n    1\n  ]\n}".to_vec());
}

#[tokio::test]
async fn version_lookup_of_missing_file_is_none() {
    let (base, _repo) = spawn_fake_github().await;
    let c = client(&base);
    c.put_file(&token(), &put("here.json", b"{}", None)).await.unwrap();

    assert_eq!(c.get_sha(&token(), &path("gone.json")).await.unwrap(), None);
    assert!(c.get_sha(&token(), &path("here.json")).await.unwrap().is_some());
    assert_eq!(
        c.get_sha(&token(), &path("data")).await.unwrap_err().status_code(),
        400
    );
}
