//! Scripted transport shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use docker_registry_browser::registry::{
    HttpRequest, HttpResponse, HttpTransport, RegistryClient, ResponseCache,
};
use docker_registry_browser::{BrowserConfig, Logger, Result};
use reqwest::Method;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const BASE: &str = "http://reg";

struct Route {
    method: Method,
    prefix: String,
    responses: VecDeque<HttpResponse>,
}

/// Answers requests from scripted routes and records everything it is sent.
/// A route with several responses hands them out in order and then keeps
/// repeating the last one. Unscripted requests get a 404.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn route(&self, method: Method, prefix: &str, responses: Vec<HttpResponse>) {
        self.routes.lock().unwrap().push(Route {
            method,
            prefix: prefix.to_string(),
            responses: responses.into(),
        });
    }

    pub fn get(&self, prefix: &str, response: HttpResponse) {
        self.route(Method::GET, prefix, vec![response]);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, prefix: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.starts_with(prefix))
            .collect()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|r| r.method == request.method && request.url.starts_with(&r.prefix));

        let response = match route {
            Some(route) if route.responses.len() > 1 => route.responses.pop_front(),
            Some(route) => route.responses.front().cloned(),
            None => None,
        };
        Ok(response.unwrap_or_else(|| {
            HttpResponse::new(404, r#"{"errors":[{"message":"manifest unknown"}]}"#)
        }))
    }
}

pub fn client(transport: &Arc<ScriptedTransport>) -> RegistryClient {
    RegistryClient::builder(transport.clone())
        .with_cache(ResponseCache::in_memory())
        .with_logger(Logger::new_quiet())
        .build()
}

pub fn config() -> BrowserConfig {
    let mut config = BrowserConfig::default();
    config.registry_url = BASE.to_string();
    config.finalize()
}

pub fn json(body: &str) -> HttpResponse {
    HttpResponse::new(200, body).with_header("Content-Type", "application/json")
}
