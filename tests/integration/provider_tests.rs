//! Provider round trip integration tests
//!
//! Run the HTTP surface against a local mock of the fal.ai queue,
//! stream, and storage APIs. These tests pin the wire protocol: submit
//! then poll then fetch for queued runs, SSE `data:` lines for streams,
//! and the two step initiate-then-PUT storage upload.

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::{App, test, web};
    use base64::{Engine, engine::general_purpose::STANDARD};
    use fal_gateway::config::Config;
    use fal_gateway::core::media::MediaFetcher;
    use fal_gateway::core::provider::FalClient;
    use fal_gateway::core::rate_limit::{Horizon, SlidingWindowLimiter};
    use fal_gateway::core::url_guard::UrlGuard;
    use fal_gateway::server::routes::configure_routes;
    use fal_gateway::server::state::AppState;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Application state pointed at a mock server, with quotas enforced
    /// and no origin allowlist on the URL guard.
    fn test_state(config: Config, mock_uri: &str) -> AppState {
        let provider = FalClient::new(&config)
            .unwrap()
            .with_endpoints(mock_uri, mock_uri, mock_uri);

        AppState {
            api_limiter: Arc::new(SlidingWindowLimiter::new(vec![Horizon::new(
                "api",
                config.api_rate_limit,
                config.api_rate_window,
            )])),
            generation_limiter: Arc::new(SlidingWindowLimiter::new(vec![
                Horizon::new("hourly", config.hourly_limit, config.hourly_window),
                Horizon::new("daily", config.daily_limit, config.daily_window),
            ])),
            provider: Arc::new(provider),
            url_guard: Arc::new(UrlGuard::new(vec![], false)),
            media: Arc::new(MediaFetcher::new().unwrap()),
            config: Arc::new(config),
        }
    }

    fn build_app(
        state: AppState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let data = web::Data::new(state.clone());
        App::new()
            .app_data(data)
            .configure(move |cfg| configure_routes(cfg, &state))
    }

    /// Queue submit response pointing back at the mock server.
    fn queue_submit_body(uri: &str) -> Value {
        json!({
            "request_id": "req-1",
            "status_url": format!("{}/requests/req-1/status", uri),
            "response_url": format!("{}/requests/req-1", uri),
        })
    }

    /// Mount the status poll (immediately COMPLETED) and the result fetch.
    async fn mount_queue_completion(server: &MockServer, result: Value) {
        Mock::given(method("GET"))
            .and(path("/requests/req-1/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "COMPLETED"})))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/requests/req-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(result))
            .mount(server)
            .await;
    }

    /// SSE body carrying the given events followed by the [DONE] marker.
    fn sse_body(events: &[Value]) -> String {
        let mut body = String::new();
        for event in events {
            body.push_str(&format!("data: {}\n\n", event));
        }
        body.push_str("data: [DONE]\n\n");
        body
    }

    /// PNG of a single solid color, as a data URL.
    fn tiny_png_data_url(r: u8, g: u8, b: u8) -> String {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([r, g, b]));
        let mut cursor = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, image::ImageFormat::Png)
            .unwrap();
        format!(
            "data:image/png;base64,{}",
            STANDARD.encode(cursor.into_inner())
        )
    }

    // ==================== Queued Generation ====================

    /// Test the full submit, poll, fetch round trip through /api/generate
    #[tokio::test]
    async fn test_generate_round_trip() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/fal-ai/gemini-25-flash-image"))
            .respond_with(ResponseTemplate::new(200).set_body_json(queue_submit_body(&uri)))
            .mount(&server)
            .await;
        mount_queue_completion(&server, json!({"data": {"seed": 42}})).await;

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "model": "fal-ai/gemini-25-flash-image",
                "input": {"prompt": "a red bottle"},
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["seed"], 42);
        assert_eq!(body["limits"]["hourly"]["remaining"], 9);
        assert_eq!(body["limits"]["daily"]["remaining"], 39);
    }

    /// Test that a caller-supplied key is forwarded and exempt from limits
    #[tokio::test]
    async fn test_generate_with_custom_key_omits_limits() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/fal-ai/gemini-25-flash-image"))
            .and(header("Authorization", "Key caller-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(queue_submit_body(&uri)))
            .mount(&server)
            .await;
        mount_queue_completion(&server, json!({"data": {"seed": 7}})).await;

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "model": "fal-ai/gemini-25-flash-image",
                "input": {"prompt": "a red bottle"},
                "customApiKey": "caller-key",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["seed"], 7);
        assert!(body.get("limits").is_none());
    }

    /// Test that a slow upstream is cut off by the wall clock budget
    #[tokio::test]
    async fn test_generate_times_out_under_budget() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/fal-ai/gemini-25-flash-image"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(queue_submit_body(&uri))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = Config {
            upstream_budget: Duration::from_millis(200),
            ..Config::default()
        };
        let state = test_state(config, &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/generate")
            .set_json(json!({
                "model": "fal-ai/gemini-25-flash-image",
                "input": {"prompt": "a red bottle"},
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::GATEWAY_TIMEOUT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "PROVIDER_TIMEOUT");
    }

    // ==================== Image Editing ====================

    /// Test the edit round trip, including guard passthrough of the source URL
    #[tokio::test]
    async fn test_edit_round_trip() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/fal-ai/gemini-25-flash-image/edit"))
            .and(body_partial_json(json!({
                "prompt": "add a red hat",
                "image_urls": ["https://example.com/person.png"],
                "num_images": 1,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(queue_submit_body(&uri)))
            .mount(&server)
            .await;
        mount_queue_completion(
            &server,
            json!({
                "images": [{
                    "url": "https://fal.media/files/out.png",
                    "content_type": "image/png",
                    "width": 1024,
                    "height": 1024,
                }],
                "description": "done",
            }),
        )
        .await;

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/edit")
            .set_json(json!({
                "prompt": "add a red hat",
                "image_url": "https://example.com/person.png",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["images"][0]["url"], "https://fal.media/files/out.png");
        assert_eq!(body["requestId"], "req-1");
        assert_eq!(body["limits"]["hourly"]["remaining"], 9);
    }

    /// Test that an upstream 422 surfaces as a client-readable input error
    #[tokio::test]
    async fn test_edit_maps_invalid_input() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/fal-ai/gemini-25-flash-image/edit"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({"detail": "Bad image"})),
            )
            .mount(&server)
            .await;

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/edit")
            .set_json(json!({
                "prompt": "add a red hat",
                "image_url": "https://example.com/person.png",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "INVALID_INPUT");
        assert_eq!(body["error"]["message"], "Invalid request - check image format");
    }

    /// Test that an upstream 401 maps to a credential error
    #[tokio::test]
    async fn test_edit_maps_auth_failure() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/fal-ai/gemini-25-flash-image/edit"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Unauthorized"})),
            )
            .mount(&server)
            .await;

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/edit")
            .set_json(json!({
                "prompt": "add a red hat",
                "image_url": "https://example.com/person.png",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["code"], "AUTH_ERROR");
        assert_eq!(body["error"]["message"], "Invalid API key");
    }

    // ==================== Streaming Workflow ====================

    /// Test that workflow returns the final stream event as the response body
    #[tokio::test]
    async fn test_workflow_returns_final_event() {
        let server = MockServer::start().await;
        let uri = server.uri();

        let events = [
            json!({"status": "IN_PROGRESS"}),
            json!({"result": {"ok": true}, "status": "COMPLETED"}),
        ];
        Mock::given(method("POST"))
            .and(path("/fal-ai/any-llm/vision/stream"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse_body(&events), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/workflow")
            .set_json(json!({
                "workflow": "fal-ai/any-llm/vision",
                "input": {"image_url": "https://example.com/a.png"},
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"result": {"ok": true}, "status": "COMPLETED"}));
    }

    // ==================== Storage Upload ====================

    /// Test the initiate-then-PUT upload round trip
    #[tokio::test]
    async fn test_upload_round_trip() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/storage/upload/initiate"))
            .and(body_partial_json(json!({"content_type": "image/png"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "upload_url": format!("{}/bucket/put-target", uri),
                "file_url": "https://v3.fal.media/files/u/abc.png",
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/bucket/put-target"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/upload")
            .set_json(json!({"image": "data:image/png;base64,aGVsbG8="}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["url"], "https://v3.fal.media/files/u/abc.png");
    }

    // ==================== Vision Describe ====================

    /// Test that describe streams the vision model and extracts the prompt
    #[tokio::test]
    async fn test_describe_round_trip() {
        let server = MockServer::start().await;
        let uri = server.uri();

        let events = [
            json!({"type": "message", "data": "thinking"}),
            json!({"output": "A woman holding a red bottle", "partial": false}),
        ];
        Mock::given(method("POST"))
            .and(path("/fal-ai/any-llm/vision/stream"))
            .and(body_partial_json(json!({
                "image_url": "https://example.com/person.png",
                "model": "google/gemini-25-flash",
                "priority": "latency",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse_body(&events), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/describe")
            .set_json(json!({
                "personImageUrl": "https://example.com/person.png",
                "objectImageUrl": "https://example.com/bottle.png",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["prompt"], "A woman holding a red bottle");
        assert_eq!(body["personImageUrl"], "https://example.com/person.png");
        assert_eq!(body["objectImageUrl"], "https://example.com/bottle.png");
        assert!(body.get("fallback").is_none());
    }

    /// Test that a vision failure degrades to a canned prompt, not an error
    #[tokio::test]
    async fn test_describe_falls_back_when_vision_fails() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/fal-ai/any-llm/vision/stream"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "kaput"})))
            .mount(&server)
            .await;

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/describe")
            .set_json(json!({
                "personImageUrl": "https://example.com/person.png",
                "objectImageUrl": "https://example.com/bottle.png",
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["fallback"], true);
        assert!(body["prompt"].as_str().unwrap().starts_with("Person "));
    }

    // ==================== Vision Compose ====================

    /// Test the full merge, upload, and vision round trip
    #[tokio::test]
    async fn test_compose_round_trip() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/storage/upload/initiate"))
            .and(body_partial_json(json!({
                "content_type": "image/jpeg",
                "file_name": "merged-image.jpg",
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "upload_url": format!("{}/bucket/merged", uri),
                "file_url": "https://v3.fal.media/files/u/merged.jpg",
            })))
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/bucket/merged"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let events = [json!({"output": "This woman holding this bottle"})];
        Mock::given(method("POST"))
            .and(path("/fal-ai/any-llm/vision/stream"))
            .and(body_partial_json(json!({
                "image_url": "https://v3.fal.media/files/u/merged.jpg",
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(sse_body(&events), "text/event-stream"),
            )
            .mount(&server)
            .await;

        let person = tiny_png_data_url(200, 40, 40);
        let object = tiny_png_data_url(40, 40, 200);

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/compose")
            .set_json(json!({
                "personImageUrl": person,
                "objectImageUrl": object,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["prompt"], "This woman holding this bottle");
        assert_eq!(body["personImageUrl"], person);
        assert_eq!(body["objectImageUrl"], object);
        assert!(body.get("fallback").is_none());
    }

    /// Test that a failed merged-image upload degrades to a canned prompt
    #[tokio::test]
    async fn test_compose_falls_back_when_upload_fails() {
        let server = MockServer::start().await;
        let uri = server.uri();

        Mock::given(method("POST"))
            .and(path("/storage/upload/initiate"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "full"})))
            .mount(&server)
            .await;

        let person = tiny_png_data_url(200, 40, 40);
        let object = tiny_png_data_url(40, 40, 200);

        let state = test_state(Config::default(), &uri);
        let app = test::init_service(build_app(state)).await;

        let req = test::TestRequest::post()
            .uri("/api/compose")
            .set_json(json!({
                "personImageUrl": person,
                "objectImageUrl": object,
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["fallback"], true);
        assert!(body["prompt"].as_str().unwrap().starts_with("Person "));
    }
}
