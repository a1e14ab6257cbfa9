use lambda_http::request::RequestContext;
use lambda_http::{Request, RequestExt};

/// API Gateway's catch-all route key; carries no routing information.
const DEFAULT_ROUTE_KEY: &str = "$default";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    List,
    Create,
    Delete,
}

/// The three route keys this function serves, matched as exact strings.
#[derive(Debug, Clone)]
pub(crate) struct RouteTable {
    list: String,
    create: String,
    delete: String,
}

impl RouteTable {
    pub(crate) fn new(prefix: &str) -> Self {
        Self {
            list: format!("GET {prefix}/bookmarks"),
            create: format!("POST {prefix}/bookmarks"),
            delete: format!("DELETE {prefix}/bookmarks/{{examId}}/{{questionId}}"),
        }
    }

    pub(crate) fn resolve(&self, route_key: &str) -> Option<Route> {
        if route_key == self.list {
            Some(Route::List)
        } else if route_key == self.create {
            Some(Route::Create)
        } else if route_key == self.delete {
            Some(Route::Delete)
        } else {
            None
        }
    }
}

/// The gateway's route key, or `"{METHOD} {path}"` for events without one.
pub(crate) fn route_key(event: &Request) -> String {
    let from_gateway = match event.request_context_ref() {
        Some(RequestContext::ApiGatewayV2(ctx)) => ctx
            .route_key
            .as_deref()
            .filter(|key| *key != DEFAULT_ROUTE_KEY),
        _ => None,
    };

    match from_gateway {
        Some(key) => key.to_string(),
        None => format!("{} {}", event.method(), event.uri().path()),
    }
}
