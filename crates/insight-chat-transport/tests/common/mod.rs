//! Scripted local HTTP server for transport integration tests.

use std::io::Read;
use std::thread::{self, JoinHandle};

use insight_chat_auth::validate_base_url;
use insight_chat_transport::HttpApi;
use tiny_http::{Header, Response, Server};

/// One scripted reply.
pub struct Reply {
    status: u16,
    body: &'static str,
    set_cookie: Option<&'static str>,
}

impl Reply {
    /// JSON reply with the given status.
    pub fn json(status: u16, body: &'static str) -> Self {
        Self {
            status,
            body,
            set_cookie: None,
        }
    }

    /// Adds a `Set-Cookie` header.
    pub fn with_cookie(mut self, cookie: &'static str) -> Self {
        self.set_cookie = Some(cookie);
        self
    }
}

/// One request as seen by the server.
#[allow(dead_code)]
pub struct Recorded {
    pub method: String,
    pub url: String,
    pub cookie: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

/// Running scripted server.
pub struct ScriptedServer {
    base_url: String,
    handle: JoinHandle<Vec<Recorded>>,
}

impl ScriptedServer {
    /// Transport pointed at this server.
    pub fn api(&self) -> HttpApi {
        let base = validate_base_url(&self.base_url).expect("loopback base url should be valid");
        HttpApi::new(base).expect("client should build")
    }

    /// Waits for every scripted reply to be served.
    pub fn finish(self) -> Vec<Recorded> {
        self.handle.join().expect("server thread should not panic")
    }
}

/// Serves the replies in order, one per incoming request.
pub fn serve(replies: Vec<Reply>) -> ScriptedServer {
    let server = Server::http("127.0.0.1:0").expect("server should bind");
    let port = server
        .server_addr()
        .to_ip()
        .expect("server should listen on tcp")
        .port();

    let handle = thread::spawn(move || {
        let mut recorded = Vec::new();
        for reply in replies {
            let mut request = server.recv().expect("request should arrive");
            let mut body = String::new();
            request
                .as_reader()
                .read_to_string(&mut body)
                .expect("request body should be utf-8");

            let header = |name: &'static str| {
                request
                    .headers()
                    .iter()
                    .find(|header| header.field.equiv(name))
                    .map(|header| header.value.as_str().to_string())
            };
            recorded.push(Recorded {
                method: request.method().to_string(),
                url: request.url().to_string(),
                cookie: header("Cookie"),
                content_type: header("Content-Type"),
                body,
            });

            let mut response = Response::from_string(reply.body)
                .with_status_code(reply.status)
                .with_header(
                    Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
                        .expect("content type header should be valid"),
                );
            if let Some(cookie) = reply.set_cookie {
                response = response.with_header(
                    Header::from_bytes(&b"Set-Cookie"[..], cookie.as_bytes())
                        .expect("cookie header should be valid"),
                );
            }
            request
                .respond(response)
                .expect("response should be written");
        }
        recorded
    });

    ScriptedServer {
        base_url: format!("http://127.0.0.1:{port}/api"),
        handle,
    }
}
