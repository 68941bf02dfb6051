use std::io::Read as _;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::Duration;

#[allow(dead_code)]
pub const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n<<>>\n%%EOF\n";

/// One request as seen by the stub.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub method: String,
    pub path: String,
    pub body: String,
}

/// A vendor stand-in: a form-encoded listing API plus a handful of documents.
///
/// `POST /api/listing?m=get` with `t=sds` returns the primary listing, which
/// links fragments `fr`, `de` and `missing` (the latter answers 500). Documents
/// live under `/files/`: `a.pdf` (application/pdf), `b-fr.pdf`
/// (binary/octet-stream), `c.pdf`, `html-error.pdf` (200 with text/html),
/// `empty.pdf` (200 with no body) and `gone.pdf` (404).
///
/// `t=intl` returns a second primary listing whose fragment ids are
/// URL-encoded in the href (`North+America`, `%C3%A9t%C3%A9`). Those fragments
/// only answer when the id arrives form-encoded exactly once.
/// `fiche_sécurité.pdf` is served under its percent-encoded path.
pub struct UpstreamStub {
    pub base_url: String,
    hits: Arc<Mutex<Vec<Hit>>>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl UpstreamStub {
    pub fn spawn() -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start upstream stub server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let hits = Arc::new(Mutex::new(Vec::new()));
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let handle = thread::spawn({
            let base_url = base_url.clone();
            let hits = Arc::clone(&hits);
            move || {
                loop {
                    if shutdown_rx.try_recv().is_ok() {
                        break;
                    }

                    let mut request = match server.recv_timeout(Duration::from_millis(50)) {
                        Ok(Some(req)) => req,
                        Ok(None) => continue,
                        Err(_) => break,
                    };

                    let method = request.method().to_string();
                    let url = request.url().to_string();
                    let path = url.split('?').next().unwrap_or(&url).to_owned();
                    let mut body = String::new();
                    let _ = request.as_reader().read_to_string(&mut body);

                    hits.lock().expect("lock hits").push(Hit {
                        method: method.clone(),
                        path: path.clone(),
                        body: body.clone(),
                    });

                    let (status, content_type, payload) = route(&base_url, &method, &path, &body);
                    let mut response =
                        tiny_http::Response::from_data(payload).with_status_code(status);
                    if let Some(content_type) = content_type {
                        let header = tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            content_type.as_bytes(),
                        )
                        .expect("build header");
                        response = response.with_header(header);
                    }
                    let _ = request.respond(response);
                }
            }
        });

        Self {
            base_url,
            hits,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/api/listing?m=get", self.base_url)
    }

    pub fn file_url(&self, name: &str) -> String {
        format!("{}/files/{name}", self.base_url)
    }

    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().expect("lock hits").clone()
    }

    pub fn count(&self, method: &str, path: &str) -> usize {
        self.hits()
            .iter()
            .filter(|hit| hit.method == method && hit.path == path)
            .count()
    }

    #[allow(dead_code)]
    pub fn listing_bodies(&self) -> Vec<String> {
        self.hits()
            .into_iter()
            .filter(|hit| hit.method == "POST" && hit.path == "/api/listing")
            .map(|hit| hit.body)
            .collect()
    }
}

impl Drop for UpstreamStub {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

const HTML: &str = "text/html; charset=utf-8";
const PDF: &str = "application/pdf";

fn route(
    base_url: &str,
    method: &str,
    path: &str,
    body: &str,
) -> (u16, Option<&'static str>, Vec<u8>) {
    match (method, path) {
        ("POST", "/api/listing") => match body {
            "t=sds" => (200, Some(HTML), primary_listing(base_url).into_bytes()),
            "t=other&i=fr" => (
                200,
                Some(HTML),
                format!(r#"<tr><td><a href="{base_url}/files/b-fr.pdf">FR</a></td></tr>"#)
                    .into_bytes(),
            ),
            "t=other&i=de" => (
                200,
                Some(HTML),
                format!(
                    r#"<tr><td><a href='{base_url}/files/c.pdf'>DE</a> {base_url}/files/a.pdf</td></tr>"#
                )
                .into_bytes(),
            ),
            "t=other&i=missing" => (500, Some(HTML), b"upstream exploded".to_vec()),
            "t=intl" => (200, Some(HTML), intl_listing().into_bytes()),
            "t=other&i=North+America" => (
                200,
                Some(HTML),
                format!(r#"<a href="{base_url}/files/a.pdf">NA</a>"#).into_bytes(),
            ),
            "t=other&i=%C3%A9t%C3%A9" => (
                200,
                Some(HTML),
                format!(r#"<a href="{base_url}/files/c.pdf">FR</a>"#).into_bytes(),
            ),
            _ => (400, Some(HTML), b"unknown listing".to_vec()),
        },
        ("GET", "/files/a.pdf") | ("GET", "/files/c.pdf") => (200, Some(PDF), PDF_BYTES.to_vec()),
        ("GET", "/files/fiche_s%C3%A9curit%C3%A9.pdf") => (200, Some(PDF), PDF_BYTES.to_vec()),
        ("GET", "/files/b-fr.pdf") => (200, Some("binary/octet-stream"), PDF_BYTES.to_vec()),
        ("GET", "/files/html-error.pdf") => (
            200,
            Some(HTML),
            b"<html><body>Access denied</body></html>".to_vec(),
        ),
        ("GET", "/files/empty.pdf") => (200, Some(PDF), Vec::new()),
        _ => (404, Some(HTML), b"not found".to_vec()),
    }
}

fn primary_listing(base_url: &str) -> String {
    format!(
        r#"<table>
  <tr><td><a href="{base_url}/files/a.pdf">Product A</a></td></tr>
  <tr><td><a href="{base_url}/files/a.pdf">Product A (again)</a></td></tr>
  <tr><td><a href="{base_url}/files/html-error.pdf">Broken</a></td></tr>
  <tr><td><a href="{base_url}/files/gone.pdf">Gone</a></td></tr>
  <tr><td>
    <a href="/resources/safety-data-sheets?t=other&i=fr">Français</a>
    <a href="/resources/safety-data-sheets?t=other&i=de">Deutsch</a>
    <a href="/resources/safety-data-sheets?t=other&i=missing">Missing</a>
  </td></tr>
</table>"#
    )
}

fn intl_listing() -> String {
    r#"<ul>
  <li><a href="/resources/safety-data-sheets?t=other&i=North+America">North America</a></li>
  <li><a href="/resources/safety-data-sheets?t=other&i=%C3%A9t%C3%A9">Été</a></li>
</ul>"#
        .to_owned()
}
