mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use common::*;
use serde_json::{json, Value};
use wiremock::{
    matchers::{body_partial_json, method, path},
    Mock, MockServer, ResponseTemplate,
};

async fn create_node(app: &TestApp, server: &MockServer) -> Value {
    let response = app
        .api(
            Method::POST,
            "/api/nodes",
            Some(json!({
                "description": "mock node",
                "protocol": "http",
                "hostname": server.address().ip().to_string(),
                "port": server.address().port(),
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response).await
}

async fn create_asset(app: &TestApp, url: &str) -> Value {
    let response = app
        .api(
            Method::POST,
            "/api/assets",
            Some(json!({ "url": url, "description": "target" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    extract_json(response).await
}

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new().await;

    let response = app.send(page_request("/api/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["status"], "healthy");

    for uri in ["/api/health/simple", "/api/health/live", "/api/health/ready"] {
        let response = app.send(page_request(uri, None)).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }
}

#[tokio::test]
async fn test_security_headers_and_correlation_id() {
    let app = TestApp::new().await;

    let response = app.send(page_request("/api/health/live", None)).await;
    let headers = response.headers();
    assert_eq!(headers.get("x-content-type-options").unwrap(), "nosniff");
    assert!(headers.get("content-security-policy").is_some());
    assert!(headers.get("x-correlation-id").is_some());
}

#[tokio::test]
async fn test_protected_routes_require_authentication() {
    let app = TestApp::new().await;

    for uri in ["/api/nodes", "/api/assets", "/api/scans", "/api/auth/me"] {
        let response = app
            .send(json_request(Method::GET, uri, None, None))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
    }

    let response = app
        .send(json_request(
            Method::GET,
            "/api/nodes",
            None,
            Some(("x-api-key", "wrong-key")),
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "AUTHENTICATION_ERROR");
    assert!(body["error"]["error_id"].is_string());
    assert!(body["error"]["timestamp"].is_string());
}

#[tokio::test]
async fn test_api_key_access() {
    let app = TestApp::new().await;

    let response = app.api(Method::GET, "/api/auth/me", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["is_api_key"], true);
    assert_eq!(body["role"], "admin");
}

#[tokio::test]
async fn test_login_me_logout() {
    let app = TestApp::new().await;
    let cookie = app.login(USER_EMAIL).await;

    let response = app
        .api_with_cookie(Method::GET, "/api/auth/me", None, &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = extract_json(response).await;
    assert_eq!(body["email"], USER_EMAIL);
    assert_eq!(body["role"], "user");

    let response = app
        .api_with_cookie(Method::POST, "/api/auth/logout", None, &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(response.headers().get(header::SET_COOKIE).is_some());
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = TestApp::new().await;

    let response = app
        .send(json_request(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": ADMIN_EMAIL, "password": "not the password" })),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(session_cookie(&response).is_none());

    let body = extract_json(response).await;
    assert_eq!(body["error"]["message"], "Invalid email or password");
}

#[tokio::test]
async fn test_tampered_cookie_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .api_with_cookie(Method::GET, "/api/auth/me", None, "session=forged")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_node_crud() {
    let app = TestApp::new().await;

    let response = app
        .api(
            Method::POST,
            "/api/nodes",
            Some(json!({
                "description": "primary",
                "protocol": "HTTPS",
                "hostname": "burp.internal",
                "port": 8443,
                "api_key": "s3cr3t",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let node = extract_json(response).await;
    assert_eq!(node["protocol"], "https");
    assert_eq!(node["has_key"], true);
    assert_eq!(node["url"], "https://burp.internal:8443/****/v0.1/");
    assert!(node.get("api_key").is_none());

    let id = node["id"].as_str().unwrap().to_string();
    let response = app
        .api(
            Method::PATCH,
            &format!("/api/nodes/{}", id),
            Some(json!({ "description": "renamed", "api_key": "" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let node = extract_json(response).await;
    assert_eq!(node["description"], "renamed");
    assert_eq!(node["has_key"], false);

    let response = app.api(Method::GET, "/api/nodes", None).await;
    let nodes = extract_json(response).await;
    assert_eq!(nodes.as_array().unwrap().len(), 1);

    let response = app
        .api(Method::DELETE, &format!("/api/nodes/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .api(Method::GET, &format!("/api/nodes/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_node_validation() {
    let app = TestApp::new().await;

    let response = app
        .api(
            Method::POST,
            "/api/nodes",
            Some(json!({
                "description": "bad",
                "protocol": "ftp",
                "hostname": "burp.internal",
                "port": 21,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = extract_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_users_cannot_manage_nodes() {
    let app = TestApp::new().await;
    let cookie = app.login(USER_EMAIL).await;

    let response = app
        .api_with_cookie(
            Method::POST,
            "/api/nodes",
            Some(json!({
                "description": "node",
                "protocol": "http",
                "hostname": "localhost",
                "port": 1337,
            })),
            &cookie,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Listing stays open to any signed in user
    let response = app
        .api_with_cookie(Method::GET, "/api/nodes", None, &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_node_status_check() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v0.1/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = TestApp::new().await;
    let node = create_node(&app, &server).await;
    let id = node["id"].as_str().unwrap();

    let response = app
        .api(Method::GET, &format!("/api/nodes/{}/status", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let status = extract_json(response).await;
    assert_eq!(status["alive"], true);
    assert_eq!(status["id"], id);
}

#[tokio::test]
async fn test_asset_crud() {
    let app = TestApp::new().await;
    let cookie = app.login(USER_EMAIL).await;

    let response = app
        .api_with_cookie(
            Method::POST,
            "/api/assets",
            Some(json!({ "url": " https://shop.example.com ", "description": "shop" })),
            &cookie,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let asset = extract_json(response).await;
    assert_eq!(asset["url"], "https://shop.example.com");

    let id = asset["id"].as_str().unwrap().to_string();
    let response = app
        .api_with_cookie(
            Method::PATCH,
            &format!("/api/assets/{}", id),
            Some(json!({ "description": "webshop" })),
            &cookie,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(extract_json(response).await["description"], "webshop");

    let response = app
        .api_with_cookie(
            Method::POST,
            "/api/assets",
            Some(json!({ "url": "not a url" })),
            &cookie,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .api_with_cookie(Method::DELETE, &format!("/api/assets/{}", id), None, &cookie)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.api(Method::GET, "/api/assets", None).await;
    assert!(extract_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_scan_launch_and_callback_flow() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0.1/scan"))
        .and(body_partial_json(json!({
            "application_logins": [
                { "type": "UsernameAndPasswordLogin", "username": "admin", "password": "pa:ss" }
            ],
            "urls": ["https://one.example.com", "https://two.example.com"],
        })))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", "42"))
        .expect(1)
        .mount(&server)
        .await;

    let app = TestApp::new().await;
    let node = create_node(&app, &server).await;
    let node_id = node["id"].as_str().unwrap().to_string();
    let one = create_asset(&app, "https://one.example.com").await;
    let two = create_asset(&app, "https://two.example.com").await;

    let response = app
        .api(
            Method::POST,
            "/api/scans",
            Some(json!({
                "description": "nightly",
                "node_id": node_id,
                "asset_ids": [one["id"], two["id"], one["id"]],
                "credentials": "admin:pa:ss",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let scan = extract_json(response).await;
    assert_eq!(scan["task_id"], "42");
    assert_eq!(scan["scan_status"], "queued");
    assert_eq!(
        scan["configuration"]["scan_callback"]["url"],
        format!("http://dashboard.test/api/callback/{}", node_id)
    );
    let scan_id = scan["id"].as_str().unwrap().to_string();

    // Login passwords only travel to the node
    let logins = &scan["configuration"]["application_logins"];
    assert_eq!(logins[0]["username"], "admin");
    assert_eq!(logins[0]["password"], "********");
    assert!(!scan.to_string().contains("pa:ss"));

    // The node reports progress without credentials
    let response = app
        .send(json_request(
            Method::POST,
            &format!("/api/callback/{}", node_id),
            Some(json!({
                "task_id": 42,
                "scan_status": "crawling",
                "scan_metrics": {
                    "crawl_requests_made": 120,
                    "audit_requests_made": 7,
                    "issue_events": 3,
                    "crawl_and_audit_caption": "Crawling",
                    "crawl_and_audit_progress": 35,
                    "total_elapsed_time": 61,
                    "audit_queue_items_completed": 0
                }
            })),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .api(Method::GET, &format!("/api/scans/{}", scan_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = extract_json(response).await;
    assert_eq!(detail["scan_status"], "crawling");
    assert_eq!(detail["crawl_requests_made"], 120);
    assert_eq!(detail["crawl_and_audit_progress"], 35);
    assert_eq!(detail["node"]["id"], node_id.as_str());
    assert_eq!(detail["assets"].as_array().unwrap().len(), 2);
    assert!(!detail.to_string().contains("pa:ss"));

    let response = app.api(Method::GET, "/api/scans", None).await;
    let scans = extract_json(response).await;
    assert_eq!(scans.as_array().unwrap().len(), 1);
    assert!(!scans.to_string().contains("pa:ss"));

    // A node with scans cannot be removed
    let response = app
        .api(Method::DELETE, &format!("/api/nodes/{}", node_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .api(Method::DELETE, &format!("/api/scans/{}", scan_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .api(Method::DELETE, &format!("/api/nodes/{}", node_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_scan_refresh_polls_node() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0.1/scan"))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", "7"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0.1/scan/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "task_id": "7",
            "scan_status": "succeeded",
            "scan_metrics": { "crawl_and_audit_progress": 100, "issue_events": 9 }
        })))
        .mount(&server)
        .await;

    let app = TestApp::new().await;
    let node = create_node(&app, &server).await;
    let asset = create_asset(&app, "https://one.example.com").await;

    let response = app
        .api(
            Method::POST,
            "/api/scans",
            Some(json!({
                "description": "refresh me",
                "node_id": node["id"],
                "asset_ids": [asset["id"]],
            })),
        )
        .await;
    let scan = extract_json(response).await;
    let scan_id = scan["id"].as_str().unwrap();

    let response = app
        .api(Method::POST, &format!("/api/scans/{}/refresh", scan_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let scan = extract_json(response).await;
    assert_eq!(scan["scan_status"], "succeeded");
    assert_eq!(scan["crawl_and_audit_progress"], 100);
    assert_eq!(scan["issue_events"], 9);
}

#[tokio::test]
async fn test_scan_launch_rejected_by_node() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0.1/scan"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad configuration"))
        .mount(&server)
        .await;

    let app = TestApp::new().await;
    let node = create_node(&app, &server).await;
    let asset = create_asset(&app, "https://one.example.com").await;

    let response = app
        .api(
            Method::POST,
            "/api/scans",
            Some(json!({
                "description": "doomed",
                "node_id": node["id"],
                "asset_ids": [asset["id"]],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = app.api(Method::GET, "/api/scans", None).await;
    assert!(extract_json(response).await.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_scan_launch_validation() {
    let app = TestApp::new().await;
    let server = MockServer::start().await;
    let node = create_node(&app, &server).await;
    let asset = create_asset(&app, "https://one.example.com").await;

    let response = app
        .api(
            Method::POST,
            "/api/scans",
            Some(json!({ "description": "empty", "node_id": node["id"], "asset_ids": [] })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .api(
            Method::POST,
            "/api/scans",
            Some(json!({
                "description": "bad credentials",
                "node_id": node["id"],
                "asset_ids": [asset["id"]],
                "credentials": "no-separator",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .api(
            Method::POST,
            "/api/scans",
            Some(json!({
                "description": "unknown node",
                "node_id": uuid::Uuid::new_v4(),
                "asset_ids": [asset["id"]],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_callback_for_unknown_scan() {
    let app = TestApp::new().await;
    let uri = format!("/api/callback/{}", uuid::Uuid::new_v4());

    let response = app
        .send(json_request(
            Method::POST,
            &uri,
            Some(json!({ "task_id": "99", "scan_status": "running" })),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .send(json_request(
            Method::POST,
            &uri,
            Some(json!({ "scan_status": "running" })),
            None,
        ))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_json_uses_error_envelope() {
    let app = TestApp::new().await;

    let cases = [
        ("/api/nodes", "{\"description\": \"half", Some("application/json")),
        ("/api/nodes", "{\"description\": \"x\", \"port\": \"eighty\"}", Some("application/json")),
        ("/api/assets", "{\"url\": \"https://a.example.com\"}", None),
        ("/api/scans", "[]", Some("application/json")),
    ];
    for (uri, body, content_type) in cases {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("x-api-key", API_KEY);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let response = app
            .send(builder.body(Body::from(body.to_string())).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{} {}", uri, body);
        assert!(response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("application/json"));

        let error = extract_json(response).await;
        assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
        assert!(error["error"]["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    let response = app
        .send(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/callback/{}", uuid::Uuid::new_v4()))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("not json"))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(extract_json(response).await["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_callbacks_are_not_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0.1/scan"))
        .respond_with(ResponseTemplate::new(201).insert_header("Location", "5"))
        .mount(&server)
        .await;

    let app = TestApp::with_settings(test_settings(&[
        ("RATE_LIMIT_ENABLED", "true"),
        ("RATE_LIMIT_REQUESTS", "2"),
    ]))
    .await;
    let node = create_node(&app, &server).await;
    let node_id = node["id"].as_str().unwrap().to_string();
    let asset = create_asset(&app, "https://busy.example.com").await;

    let response = app
        .api(
            Method::POST,
            "/api/scans",
            Some(json!({
                "description": "chatty",
                "node_id": node_id,
                "asset_ids": [asset["id"]],
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    for progress in [10, 20, 30, 40, 50] {
        let response = app
            .send(json_request(
                Method::POST,
                &format!("/api/callback/{}", node_id),
                Some(json!({
                    "task_id": "5",
                    "scan_status": "auditing",
                    "scan_metrics": { "crawl_and_audit_progress": progress }
                })),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT, "progress {}", progress);
    }

    let scans = app.state.scan_service.list().await.unwrap();
    assert_eq!(scans[0].scan.crawl_and_audit_progress, 50);
}

#[tokio::test]
async fn test_user_management_is_admin_only() {
    let app = TestApp::new().await;

    let user_cookie = app.login(USER_EMAIL).await;
    let response = app
        .api_with_cookie(Method::GET, "/api/users", None, &user_cookie)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin_cookie = app.login(ADMIN_EMAIL).await;
    let response = app
        .api_with_cookie(
            Method::POST,
            "/api/users",
            Some(json!({
                "email": "New.User@Example.com",
                "name": "New User",
                "password": "long enough password",
            })),
            &admin_cookie,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = extract_json(response).await;
    assert_eq!(created["email"], "new.user@example.com");
    assert_eq!(created["role"], "user");
    assert!(created.get("password_hash").is_none());

    let response = app
        .api_with_cookie(
            Method::POST,
            "/api/users",
            Some(json!({
                "email": "new.user@example.com",
                "name": "Again",
                "password": "long enough password",
            })),
            &admin_cookie,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .api_with_cookie(Method::GET, "/api/users", None, &admin_cookie)
        .await;
    assert_eq!(extract_json(response).await.as_array().unwrap().len(), 3);
}
