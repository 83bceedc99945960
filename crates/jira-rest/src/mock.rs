//! Scripted in-memory transport
//!
//! Routes match on method and path, optionally on a subset of query
//! parameters. Each route serves its queued responses in order and keeps
//! repeating the last one. Every request is recorded for assertions.
//! An unmatched request panics so tests fail loudly on unexpected I/O.

use crate::error::Result;
use crate::transport::{ApiRequest, RawResponse, Transport};
use async_trait::async_trait;
use reqwest::Method;
use std::collections::VecDeque;
use std::sync::Mutex;

struct Route {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    responses: VecDeque<RawResponse>,
}

impl Route {
    fn matches(&self, request: &ApiRequest) -> bool {
        self.method == request.method
            && self.path == request.path
            && self
                .query
                .iter()
                .all(|(k, v)| request.query_value(k) == Some(v.as_str()))
    }

    fn next_response(&mut self) -> RawResponse {
        if self.responses.len() > 1 {
            self.responses.pop_front().unwrap_or_else(|| RawResponse::new(500, ""))
        } else {
            self.responses
                .front()
                .cloned()
                .unwrap_or_else(|| RawResponse::new(500, ""))
        }
    }
}

/// Test double for [`Transport`]
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a route. Later registrations for an identical route take priority.
    pub fn on(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        responses: Vec<RawResponse>,
    ) {
        let route = Route {
            method,
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            responses: responses.into(),
        };
        self.routes.lock().unwrap().insert(0, route);
    }

    pub fn on_get(&self, path: &str, response: RawResponse) {
        self.on(Method::GET, path, &[], vec![response]);
    }

    pub fn on_get_query(&self, path: &str, query: &[(&str, &str)], response: RawResponse) {
        self.on(Method::GET, path, query, vec![response]);
    }

    pub fn on_get_sequence(&self, path: &str, responses: Vec<RawResponse>) {
        self.on(Method::GET, path, &[], responses);
    }

    pub fn on_post(&self, path: &str, response: RawResponse) {
        self.on(Method::POST, path, &[], vec![response]);
    }

    pub fn on_put(&self, path: &str, response: RawResponse) {
        self.on(Method::PUT, path, &[], vec![response]);
    }

    pub fn on_delete(&self, path: &str, response: RawResponse) {
        self.on(Method::DELETE, path, &[], vec![response]);
    }

    /// Every request sent so far, in order
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Number of requests sent with `method` to `path`
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Number of requests sent with `method`, regardless of path
    pub fn count_method(&self, method: Method) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        match routes.iter_mut().find(|route| route.matches(request)) {
            Some(route) => Ok(route.next_response()),
            None => panic!("MockTransport: no route for {}", request),
        }
    }
}
