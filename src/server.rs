use std::fs::File;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use anyhow::{anyhow, Result};
use percent_encoding::percent_decode_str;
use tiny_http::{Header, Method, Request, Response, ResponseBox, Server};
use tracing::{error, info, warn};
use crate::router::{ProxyRequest, Route, Router};

/// Binds the listener. Fails if the address is invalid or in use.
pub fn bind(listen: &str) -> Result<Server> {
    Server::http(listen).map_err(|e| anyhow!("could not listen on {listen}: {e}"))
}

/// The address a bound server actually listens on.
pub fn local_addr(server: &Server) -> Option<SocketAddr> {
    server.server_addr().to_ip()
}

/// Accepts requests forever, one thread per request.
pub fn run(server: Server, router: Arc<Router>) {
    for request in server.incoming_requests() {
        let router = Arc::clone(&router);
        thread::spawn(move || handle(&router, request));
    }
}

/// Binds `listen` from the router's config and serves until the process exits.
pub fn serve(router: Arc<Router>) -> Result<()> {
    let server = bind(&router.config().listen)?;
    info!(
        listen = %router.config().listen,
        cache = %router.cache().root().display(),
        rules = router.config().rules.rules().len(),
        "modgate listening"
    );
    run(server, router);
    Ok(())
}

fn handle(router: &Router, request: Request) {
    if !matches!(request.method(), Method::Get | Method::Head) {
        respond(request, Response::empty(405).boxed());
        return;
    }

    let Some(path) = request_path(request.url()) else {
        respond(request, Response::from_string("invalid URL escape\n").with_status_code(400).boxed());
        return;
    };
    let path = path.as_str();
    let host = header(&request, "Host").unwrap_or_else(|| router.config().listen.clone());
    let secure = header(&request, "X-Forwarded-Proto")
        .is_some_and(|proto| proto.eq_ignore_ascii_case("https"));
    let proxy_req = ProxyRequest { path, host: &host, secure };

    let response = match router.route(&proxy_req) {
        Ok(Route::Serve(file)) => file_response(&file),
        Ok(Route::NotFound) => not_found(),
        Ok(Route::EmptyList) => Response::from_string("").with_status_code(200).boxed(),
        Ok(Route::Redirect(location)) => match Header::from_bytes(&b"Location"[..], location.as_bytes()) {
            Ok(header) => Response::empty(302).with_header(header).boxed(),
            Err(()) => {
                error!(%location, "invalid redirect location");
                Response::empty(500).boxed()
            }
        },
        Err(err) => {
            error!(path, kind = err.category(), error = %err, "request failed");
            Response::from_string(err.to_string())
                .with_status_code(err.status_code())
                .boxed()
        }
    };
    respond(request, response);
}

/// Strips the query string and percent-decodes the rest. `None` if the
/// decoded path is not UTF-8.
fn request_path(url: &str) -> Option<String> {
    let raw = url.split_once('?').map_or(url, |(path, _)| path);
    percent_decode_str(raw).decode_utf8().ok().map(|path| path.into_owned())
}

fn respond(request: Request, response: ResponseBox) {
    let url = request.url().to_string();
    if let Err(e) = request.respond(response) {
        warn!(%url, error = %e, "could not write response");
    }
}

fn header(request: &Request, name: &'static str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(name))
        .map(|h| h.value.as_str().to_string())
}

fn file_response(path: &Path) -> ResponseBox {
    let Ok(file) = File::open(path) else {
        return not_found();
    };
    let response = Response::from_file(file);
    match Header::from_bytes(&b"Content-Type"[..], content_type(path).as_bytes()) {
        Ok(header) => response.with_header(header).boxed(),
        Err(()) => response.boxed(),
    }
}

fn not_found() -> ResponseBox {
    Response::from_string("404 page not found\n").with_status_code(404).boxed()
}

/// Content type by artifact suffix.
pub fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("info") => "application/json",
        Some("mod") => "text/plain; charset=utf-8",
        Some("zip") => "application/zip",
        _ => "application/octet-stream",
    }
}
