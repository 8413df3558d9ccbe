//! Tests for the schema introspection endpoints: the aggregate document at
//! `GET {base}/schema` and the per-route documents derived from each
//! endpoint path and method.

use http::Method;
use schemaroute::dispatcher::{HandlerFlow, RouteRequest};
use schemaroute::envelope::{build_response_schema, Responder};
use schemaroute::registrar::{build_service, SchemaServerOptions};
use schemaroute::routes::{RouteDefinition, RouteMetadata, RouteSource, SchemaMetadata};
use schemaroute::server::{HttpServer, ServerHandle};
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;

mod common;

fn post_schema() -> Value {
    json!({
        "title": "Post",
        "type": "object",
        "properties": {
            "title": { "type": "string", "minLength": 1 },
            "body": { "type": "string" }
        },
        "required": ["title"]
    })
}

fn post_routes() -> Vec<RouteSource<()>> {
    let ok = |_req: &RouteRequest, _ctx: &(), responder: &mut Responder| -> anyhow::Result<HandlerFlow> {
        responder.send(200, json!({}));
        Ok(HandlerFlow::Done)
    };
    vec![
        RouteSource::new("posts", "get-posts", "routes/posts/get-posts.rs", move || {
            Ok(RouteDefinition::new("/")
                .method(Method::GET)
                .metadata(RouteMetadata {
                    title: "Get posts".to_string(),
                    description: "Lists posts".to_string(),
                    since_version: "1.0.0".to_string(),
                    is_deprecated: false,
                })
                .response_schema(build_response_schema(json!({
                    "title": "Posts",
                    "type": "array",
                    "items": post_schema()
                })))
                .handler(ok))
        }),
        RouteSource::new("posts", "get-post", "routes/posts/get-post.rs", move || {
            Ok(RouteDefinition::new("/:id")
                .method(Method::GET)
                .metadata(RouteMetadata {
                    title: "Get post".to_string(),
                    description: "Fetches one post".to_string(),
                    since_version: "1.0.0".to_string(),
                    is_deprecated: false,
                })
                .response_schema(build_response_schema(post_schema()))
                .handler(ok))
        }),
        RouteSource::new("posts", "create-post", "routes/posts/create-post.rs", move || {
            Ok(RouteDefinition::new("/")
                .method(Method::POST)
                .metadata(RouteMetadata {
                    title: "Create post".to_string(),
                    description: "Creates a post".to_string(),
                    since_version: "1.1.0".to_string(),
                    is_deprecated: false,
                })
                .request_schema(post_schema())
                .response_schema(build_response_schema(post_schema()))
                .handler(ok))
        }),
        // ungrouped: reachable, but invisible to schema introspection
        RouteSource::new("", "health", "routes/health.rs", move || {
            Ok(RouteDefinition::new("/health").method(Method::GET).handler(ok))
        }),
    ]
}

struct PostsTestServer {
    handle: Option<ServerHandle>,
    addr: SocketAddr,
}

impl PostsTestServer {
    fn start(base_path: &str) -> Self {
        common::setup();
        let service = build_service(SchemaServerOptions {
            routes: post_routes(),
            context: Arc::new(()),
            metadata: SchemaMetadata {
                title: "Posts API".to_string(),
                description: "Blog post service".to_string(),
                version: "2.0.0".to_string(),
            },
            base_path: base_path.to_string(),
        })
        .unwrap();

        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let handle = HttpServer(service).start(addr).unwrap();
        handle.wait_ready().unwrap();
        Self {
            handle: Some(handle),
            addr,
        }
    }

    fn addr(&self) -> &SocketAddr {
        &self.addr
    }
}

impl Drop for PostsTestServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }
}

#[test]
fn test_aggregate_schema_lists_grouped_routes() {
    let server = PostsTestServer::start("");
    let response = common::get(server.addr(), "/schema");
    assert_eq!(common::parse_status(&response), 200);

    let body = common::parse_json_body(&response);
    assert_eq!(body["metadata"]["title"], json!("Posts API"));
    assert_eq!(body["metadata"]["version"], json!("2.0.0"));

    let routes = body["routes"].as_array().unwrap();
    // the ungrouped health route is excluded
    assert_eq!(routes.len(), 3);
    assert!(routes.iter().all(|r| r["group"] == json!("posts")));

    let get_post = routes
        .iter()
        .find(|r| r["name"] == json!("get-post"))
        .unwrap();
    assert_eq!(get_post["method"], json!("get"));
    assert_eq!(get_post["endpointUrl"], json!("/posts/:id"));
    assert_eq!(get_post["schemaUrl"], json!("/schema/posts/get"));
}

#[test]
fn test_route_schema_document() {
    let server = PostsTestServer::start("");
    let response = common::get(server.addr(), "/schema/posts/post");
    assert_eq!(common::parse_status(&response), 200);

    let body = common::parse_json_body(&response);
    assert_eq!(body["name"], json!("create-post"));
    assert_eq!(body["method"], json!("post"));
    assert_eq!(body["metadata"]["sinceVersion"], json!("1.1.0"));
    assert_eq!(body["metadata"]["isDeprecated"], json!(false));
    assert_eq!(body["requestSchema"]["title"], json!("Post"));
    assert!(body["responseSchema"].is_object());
}

#[test]
fn test_parameterized_route_shares_schema_path_first_match_wins() {
    let server = PostsTestServer::start("");
    // /posts/:id and /posts both collapse onto /schema/posts/get; the route
    // earlier in match order owns the document
    let response = common::get(server.addr(), "/schema/posts/get");
    assert_eq!(common::parse_status(&response), 200);
    let body = common::parse_json_body(&response);
    assert_eq!(body["name"], json!("get-post"));
    assert_eq!(body["path"], json!("/:id"));
}

#[test]
fn test_schema_urls_are_resolvable() {
    let server = PostsTestServer::start("");
    let aggregate = common::parse_json_body(&common::get(server.addr(), "/schema"));
    for route in aggregate["routes"].as_array().unwrap() {
        let url = route["schemaUrl"].as_str().unwrap();
        let response = common::get(server.addr(), url);
        assert_eq!(common::parse_status(&response), 200, "unresolvable {url}");
    }
}

#[test]
fn test_base_path_prefixes_every_url() {
    let server = PostsTestServer::start("/api/v1");
    let response = common::get(server.addr(), "/api/v1/schema");
    assert_eq!(common::parse_status(&response), 200);

    let body = common::parse_json_body(&response);
    let get_post = body["routes"]
        .as_array()
        .unwrap()
        .iter()
        .find(|r| r["name"] == json!("get-post"))
        .unwrap()
        .clone();
    assert_eq!(get_post["endpointUrl"], json!("/api/v1/posts/:id"));
    assert_eq!(get_post["schemaUrl"], json!("/api/v1/schema/posts/get"));

    // un-prefixed paths no longer exist
    assert_eq!(common::parse_status(&common::get(server.addr(), "/schema")), 404);
    assert_eq!(common::parse_status(&common::get(server.addr(), "/posts")), 404);

    // the service itself answers under the prefix
    assert_eq!(
        common::parse_status(&common::get(server.addr(), "/api/v1/health")),
        200
    );
}

#[test]
fn test_schema_endpoint_is_get_only() {
    let server = PostsTestServer::start("");
    let response = common::post_json(server.addr(), "/schema", &json!({}));
    assert_eq!(common::parse_status(&response), 404);
}
