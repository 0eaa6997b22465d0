use crate::core::engine::TarotEngine;
use crate::domain::ports::{EntropySource, InterpretationRequest, Interpreter};
use crate::utils::error::{Result, TarotError};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tokio::runtime::Handle;

#[derive(Debug, Deserialize)]
struct StartRequest {
    question: String,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct DrawRequest {
    card_id: String,
}

/// Transport-independent result of routing one request.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Json {
        status: u16,
        body: serde_json::Value,
    },
    Asset {
        body: Vec<u8>,
        content_type: &'static str,
    },
    NotFound,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Reply::Json { status, body },
            Err(e) => Reply::error(500, e.to_string()),
        }
    }

    fn error(status: u16, message: impl Into<String>) -> Self {
        Reply::Json {
            status,
            body: json!({ "error": message.into() }),
        }
    }

    fn from_error(err: &TarotError) -> Self {
        let status = match err {
            TarotError::Validation(_) => 422,
            TarotError::Session(_) => 409,
            TarotError::Interpretation { .. } => 502,
            _ => 500,
        };
        Reply::error(status, err.user_friendly_message())
    }

    pub fn status(&self) -> u16 {
        match self {
            Reply::Json { status, .. } => *status,
            Reply::Asset { .. } => 200,
            Reply::NotFound => 404,
        }
    }
}

pub struct WebApp<E: EntropySource, I: Interpreter> {
    engine: TarotEngine<E, I>,
    static_dir: PathBuf,
}

impl<E: EntropySource, I: Interpreter> WebApp<E, I> {
    pub fn new(engine: TarotEngine<E, I>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            engine,
            static_dir: static_dir.into(),
        }
    }

    pub async fn route(&self, method: &Method, url: &str, body: &[u8]) -> Reply {
        let path = url.split('?').next().unwrap_or(url);

        match (method, path) {
            (&Method::Get, "/api/random") => match self.engine.random().await {
                Ok(data) => Reply::json(200, &json!({ "data": data, "success": true })),
                Err(e) => {
                    tracing::error!("Error calling Random API: {}", e);
                    Reply::error(500, e.to_string())
                }
            },
            (&Method::Post, "/api/interpret") => {
                let request: InterpretationRequest = match parse_body(body) {
                    Ok(request) => request,
                    Err(reply) => return reply,
                };
                match self.engine.interpret(&request).await {
                    Ok(completion) => Reply::json(200, &completion),
                    Err(e) => Reply::error(500, e.to_string()),
                }
            }
            (&Method::Get, "/api/session") => Reply::json(200, &self.engine.snapshot().await),
            (&Method::Post, "/api/session/start") => {
                let request: StartRequest = match parse_body(body) {
                    Ok(request) => request,
                    Err(reply) => return reply,
                };
                match self.engine.start(&request.question, request.count).await {
                    Ok(snapshot) => Reply::json(200, &snapshot),
                    Err(e) => Reply::from_error(&e),
                }
            }
            (&Method::Post, "/api/session/draw") => {
                let request: DrawRequest = match parse_body(body) {
                    Ok(request) => request,
                    Err(reply) => return reply,
                };
                match self.engine.draw(&request.card_id).await {
                    Ok(outcome) => Reply::json(200, &outcome),
                    Err(e) => Reply::from_error(&e),
                }
            }
            (&Method::Post, "/api/session/reset") => Reply::json(200, &self.engine.reset().await),
            (&Method::Post, "/api/session/interpret") => {
                match self.engine.interpret_session().await {
                    Ok(outcome) => Reply::json(200, &outcome),
                    Err(e) => Reply::from_error(&e),
                }
            }
            (&Method::Get, _) => self.asset(path).await,
            _ => Reply::NotFound,
        }
    }

    async fn asset(&self, path: &str) -> Reply {
        let Some(file) = resolve_asset(&self.static_dir, path) else {
            tracing::warn!("Rejected asset path: {}", path);
            return Reply::NotFound;
        };

        match tokio::fs::read(&file).await {
            Ok(body) => Reply::Asset {
                body,
                content_type: content_type(&file),
            },
            Err(_) => Reply::NotFound,
        }
    }

    /// Blocking accept loop; requests are handled one at a time.
    pub fn serve(&self, addr: &str, runtime: Handle) -> Result<()> {
        let server = Server::http(addr).map_err(|e| TarotError::Server {
            message: format!("failed to bind {}: {}", addr, e),
        })?;

        tracing::info!("Server running at http://{}", addr);
        for request in server.incoming_requests() {
            if let Err(e) = self.handle_request(request, &runtime) {
                tracing::warn!("request error: {}", e);
            }
        }
        Ok(())
    }

    fn handle_request(&self, mut request: Request, runtime: &Handle) -> Result<()> {
        let method = request.method().clone();
        let url = request.url().to_string();

        // 以位元組讀取，非 UTF-8 內容交給 JSON 解析回 400
        let mut body = Vec::new();
        if method == Method::Post {
            request.as_reader().read_to_end(&mut body)?;
        }

        let reply = runtime.block_on(self.route(&method, &url, &body));
        tracing::debug!("{} {} -> {}", method, url, reply.status());
        respond(request, reply)
    }
}

fn parse_body<T: for<'de> Deserialize<'de>>(body: &[u8]) -> std::result::Result<T, Reply> {
    serde_json::from_slice(body)
        .map_err(|e| Reply::error(400, format!("invalid request body: {}", e)))
}

/// Maps a URL path onto the static directory; anything but plain path segments is refused.
fn resolve_asset(static_dir: &Path, path: &str) -> Option<PathBuf> {
    let relative = path.trim_start_matches('/');
    let relative = if relative.is_empty() { "index.html" } else { relative };

    let candidate = Path::new(relative);
    if candidate
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return None;
    }
    Some(static_dir.join(candidate))
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("html") => "text/html; charset=utf-8",
        Some("js") => "application/javascript",
        Some("css") => "text/css; charset=utf-8",
        Some("json") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("ico") => "image/x-icon",
        Some("woff2") => "font/woff2",
        _ => "application/octet-stream",
    }
}

fn header(value: &str) -> Result<Header> {
    Header::from_bytes(&b"Content-Type"[..], value.as_bytes()).map_err(|_| TarotError::Server {
        message: format!("invalid content type header: {}", value),
    })
}

fn respond(request: Request, reply: Reply) -> Result<()> {
    let response = match reply {
        Reply::Json { status, body } => Response::from_string(body.to_string())
            .with_status_code(StatusCode(status))
            .with_header(header("application/json; charset=utf-8")?),
        Reply::Asset { body, content_type } => {
            Response::from_data(body).with_header(header(content_type)?)
        }
        Reply::NotFound => Response::from_string("Not Found").with_status_code(StatusCode(404)),
    };
    request.respond(response)?;
    Ok(())
}
