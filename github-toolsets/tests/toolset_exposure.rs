use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use github_toolsets::config::ServerConfig;
use github_toolsets::github::{
    ApiRequest, ApiResponse, Client, RemoteApi, RemoteResult, default_toolset_group,
};
use github_toolsets::primitives::Safety;
use github_toolsets::registry::{ToolsetError, ToolsetGroup};
use github_toolsets::session::{CONTROL_CAPABILITIES, ExposureBinder, Session};
use serde_json::{Value, json};

/// Remote API fake that answers every REST call with a fixed response.
struct CannedApi {
    status: u16,
    body: String,
    calls: AtomicUsize,
    paths: Mutex<Vec<String>>,
}

impl CannedApi {
    fn new(status: u16, body: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            status,
            body: body.into(),
            calls: AtomicUsize::new(0),
            paths: Mutex::new(Vec::new()),
        })
    }

    fn ok() -> Arc<Self> {
        Self::new(200, r#"{"number":1,"title":"Crash on start"}"#)
    }
}

#[async_trait]
impl RemoteApi for CannedApi {
    async fn send(&self, request: ApiRequest) -> RemoteResult<ApiResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(request.path().to_owned());
        Ok(ApiResponse::new(self.status, self.body.clone()))
    }

    async fn graphql(&self, _query: &str, _variables: Value) -> RemoteResult<Value> {
        Ok(json!({ "repository": { "pullRequest": { "reviews": { "nodes": [] } } } }))
    }
}

fn config(pairs: &[(&str, &str)]) -> ServerConfig {
    let values: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
        .collect();
    ServerConfig::from_map(&values).expect("valid config")
}

fn server(api: &Arc<CannedApi>, config: &ServerConfig) -> ExposureBinder {
    let client: Client = Arc::clone(api) as Client;
    let group = default_toolset_group(&client, config.read_only).expect("toolsets build");
    config.apply(&group).expect("startup enable");
    ExposureBinder::new(Arc::new(group)).expect("unique names")
}

fn issue_args() -> Value {
    json!({ "owner": "octo", "repo": "hello", "issue_number": 1 })
}

async fn call_text(session: &Session, name: &str, args: Value) -> (String, bool) {
    let result = session.call(name, args).await.expect("call completes");
    (result.content().to_owned(), result.is_error())
}

#[tokio::test]
async fn dynamic_session_enables_a_toolset_and_calls_into_it() {
    let api = CannedApi::ok();
    let binder = server(&api, &config(&[("GITHUB_DYNAMIC_TOOLSETS", "true")]));
    let session = binder.connect();

    assert_eq!(session.bound_count(), CONTROL_CAPABILITIES.len());
    assert!(!session.has_capability("get_issue"));

    let (text, is_error) =
        call_text(&session, "enable_toolset", json!({ "toolset": "issues" })).await;
    assert_eq!(text, "Toolset issues enabled");
    assert!(!is_error);
    assert!(session.has_capability("get_issue"));
    assert!(session.has_capability("create_issue"));

    let (text, is_error) = call_text(&session, "get_issue", issue_args()).await;
    assert!(!is_error);
    assert!(text.contains("Crash on start"));
    assert_eq!(
        api.paths.lock().unwrap().as_slice(),
        ["/repos/octo/hello/issues/1"]
    );
}

#[tokio::test]
async fn enabling_twice_binds_nothing_new() {
    let api = CannedApi::ok();
    let binder = server(&api, &config(&[("GITHUB_TOOLSETS", "")]));
    let session = binder.connect();

    call_text(&session, "enable_toolset", json!({ "toolset": "dependabot" })).await;
    let bound = session.bound_count();
    let (text, is_error) =
        call_text(&session, "enable_toolset", json!({ "toolset": "dependabot" })).await;

    assert_eq!(text, "Toolset dependabot is already enabled");
    assert!(!is_error);
    assert_eq!(session.bound_count(), bound);
    assert_eq!(bound, CONTROL_CAPABILITIES.len() + 2);
}

#[tokio::test]
async fn read_only_server_never_exposes_mutating_capabilities() {
    let api = CannedApi::ok();
    let binder = server(&api, &config(&[("GITHUB_READ_ONLY", "true")]));
    let session = binder.connect();

    assert!(session.has_capability("get_issue"));
    assert!(!session.has_capability("create_issue"));
    assert!(!session.has_capability("merge_pull_request"));
    assert!(
        session
            .capabilities()
            .iter()
            .all(|capability| capability.safety() == Safety::ReadOnly)
    );

    let err = session
        .call("create_issue", json!({ "owner": "o", "repo": "r", "title": "x" }))
        .await
        .expect_err("not bound");
    assert!(err.to_string().contains("create_issue"));
    assert_eq!(api.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn strict_startup_rejects_unknown_toolsets() {
    let api = CannedApi::ok();
    let client: Client = api as Client;
    let group = default_toolset_group(&client, false).unwrap();
    let strict = config(&[
        ("GITHUB_TOOLSETS", "issues,nonexistent"),
        ("GITHUB_STRICT_TOOLSETS", "true"),
    ]);

    let err = strict.apply(&group).expect_err("strict");
    let cause = err.downcast_ref::<ToolsetError>().expect("toolset error");
    assert!(matches!(cause, ToolsetError::ToolsetNotFound { name } if name == "nonexistent"));
}

#[test]
fn lenient_startup_skips_unknown_toolsets() {
    let api = CannedApi::ok();
    let client: Client = api as Client;
    let group = default_toolset_group(&client, false).unwrap();
    config(&[("GITHUB_TOOLSETS", "issues,nonexistent")])
        .apply(&group)
        .unwrap();

    assert!(group.is_enabled("issues"));
    assert!(!group.is_enabled("nonexistent"));
    assert!(!group.is_enabled("search"));
}

#[tokio::test]
async fn all_enables_every_toolset() {
    let api = CannedApi::ok();
    let binder = server(&api, &config(&[]));
    let session = binder.connect();

    let (text, _) = call_text(&session, "list_available_toolsets", json!({})).await;
    let listing: Vec<Value> = serde_json::from_str(&text).unwrap();
    assert_eq!(listing.len(), 6);
    assert!(listing.iter().all(|toolset| toolset["enabled"] == true));
    assert!(session.has_capability("search_code"));
    assert!(session.has_capability("list_secret_scanning_alerts"));
}

#[tokio::test]
async fn unknown_toolset_is_an_error_result() {
    let api = CannedApi::ok();
    let binder = server(&api, &config(&[("GITHUB_TOOLSETS", "")]));
    let session = binder.connect();
    let before = session.bound_count();

    let (text, is_error) =
        call_text(&session, "enable_toolset", json!({ "toolset": "wiki" })).await;
    assert!(is_error);
    assert!(text.starts_with("invalid arguments for enable_toolset"));
    assert_eq!(session.bound_count(), before);

    let (text, is_error) =
        call_text(&session, "get_toolset_tools", json!({ "toolset": "wiki" })).await;
    assert!(is_error);
    assert!(text.contains("wiki"));
}

#[tokio::test]
async fn enable_reaches_every_live_session() {
    let api = CannedApi::ok();
    let binder = server(&api, &config(&[("GITHUB_TOOLSETS", "")]));
    let first = binder.connect();
    let second = binder.connect();

    call_text(&first, "enable_toolset", json!({ "toolset": "search" })).await;

    assert!(first.has_capability("search_users"));
    assert!(second.has_capability("search_users"));
    assert!(binder.connect().has_capability("search_users"));

    drop(second);
    assert_eq!(binder.live_sessions(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_enables_transition_once() {
    let api = CannedApi::ok();
    let binder = server(&api, &config(&[("GITHUB_TOOLSETS", "")]));
    let session = binder.connect();

    let calls = (0..8).map(|_| {
        let session = Arc::clone(&session);
        tokio::spawn(async move {
            session
                .call("enable_toolset", json!({ "toolset": "pull_requests" }))
                .await
                .expect("call completes")
                .content()
                .to_owned()
        })
    });
    let results: Vec<String> = futures::future::join_all(calls)
        .await
        .into_iter()
        .map(|joined| joined.expect("task completes"))
        .collect();

    let enabled = results
        .iter()
        .filter(|text| *text == "Toolset pull_requests enabled")
        .count();
    assert_eq!(enabled, 1);
    assert_eq!(session.bound_count(), CONTROL_CAPABILITIES.len() + 8);
}

#[tokio::test]
async fn remote_failures_and_bad_pages_come_back_as_error_results() {
    let api = CannedApi::new(404, "Not Found");
    let binder = server(&api, &config(&[("GITHUB_TOOLSETS", "issues")]));
    let session = binder.connect();

    let (text, is_error) = call_text(&session, "get_issue", issue_args()).await;
    assert!(is_error);
    assert_eq!(text, "failed to get issue: Not Found");

    let (text, is_error) = call_text(
        &session,
        "list_issues",
        json!({ "owner": "octo", "repo": "hello", "perPage": 101 }),
    )
    .await;
    assert!(is_error);
    assert!(text.contains("perPage"));
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
}

#[test]
fn capability_names_collide_with_controls() {
    use github_toolsets::primitives::{CallContext, CallError, CallResult, CapabilityDescriptor};
    use github_toolsets::registry::Toolset;

    let rogue = CapabilityDescriptor::builder("enable_toolset")
        .description("shadows the control capability")
        .read_only()
        .handler(|_ctx: CallContext, _args: Value| async move {
            Ok::<_, CallError>(CallResult::success("shadowed"))
        })
        .build()
        .unwrap();
    let group = ToolsetGroup::new(false);
    group.add_toolset(
        Toolset::new("rogue", "collides")
            .add_read_capabilities([rogue])
            .unwrap(),
    );

    let err = ExposureBinder::new(Arc::new(group)).expect_err("collision");
    assert!(err.to_string().contains("enable_toolset"));
}
