use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

use tempfile::tempdir;

use super::*;
use crate::config::SearchSettings;
use crate::error::{DownloadError, NetworkError};
use crate::library::Category;

/// Serve one canned HTTP response per entry, in order, on 127.0.0.1.
/// The join handle yields the request lines that were received.
fn serve(responses: Vec<Vec<u8>>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().unwrap();
            let mut req = Vec::new();
            let mut buf = [0u8; 1024];
            while !req.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                req.extend_from_slice(&buf[..n]);
            }
            let text = String::from_utf8_lossy(&req);
            seen.push(text.lines().next().unwrap_or_default().to_string());
            let _ = stream.write_all(&response);
            let _ = stream.flush();
        }
        seen
    });

    (base, handle)
}

fn http_ok(content_type: &str, body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

fn http_status(code: u16) -> Vec<u8> {
    format!("HTTP/1.1 {code} Oops\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").into_bytes()
}

fn client_for(base: &str) -> SearchClient {
    SearchClient::new(&SearchSettings {
        endpoint: format!("{base}/w/api.php"),
        timeout_secs: 5,
        ..SearchSettings::default()
    })
    .unwrap()
}

const SEARCH_BODY: &str = r#"{
  "batchcomplete": "",
  "query": {
    "searchinfo": {"totalhits": 2},
    "search": [
      {"ns": 6, "title": "File:Rain on roof.ogg", "snippet": "light <span class=\"searchmatch\">rain</span> &amp; thunder"},
      {"ns": 6, "title": "File:Heavy rain.wav", "snippet": ""}
    ]
  }
}"#;

const FILE_INFO_BODY: &str = r#"{
  "query": {
    "pages": {
      "12345": {
        "ns": 6,
        "title": "File:Rain on roof.ogg",
        "imageinfo": [
          {"url": "https://upload.wikimedia.org/wikipedia/commons/a/ab/Rain_on_roof.ogg", "mime": "audio/ogg"}
        ]
      }
    }
  }
}"#;

#[test]
fn search_then_resolve_first_title() {
    let (base, server) = serve(vec![
        http_ok("application/json", SEARCH_BODY.as_bytes()),
        http_ok("application/json", FILE_INFO_BODY.as_bytes()),
    ]);
    let client = client_for(&base);

    let hits = client.search("rain").unwrap();
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "File:Rain on roof.ogg");
    assert_eq!(hits[0].plain_snippet(), "light rain & thunder");

    let info = client.resolve_download_url(&hits[0].title).unwrap().unwrap();
    assert!(info.url.ends_with("Rain_on_roof.ogg"));
    assert!(info.mime_type.starts_with("audio/"));

    let requests = server.join().unwrap();
    assert!(requests[0].starts_with("GET /w/api.php?"));
    for param in [
        "action=query",
        "list=search",
        "srsearch=rain+filetype%3Aaudio",
        "srnamespace=6",
        "srlimit=50",
        "format=json",
    ] {
        assert!(requests[0].contains(param), "{param} missing from {}", requests[0]);
    }
    assert!(requests[1].contains("prop=imageinfo"));
    assert!(requests[1].contains("iiprop=url%7Cmime"));
    assert!(requests[1].contains("titles=File%3ARain+on+roof.ogg"));
}

#[test]
fn blank_keyword_skips_the_network() {
    let client = client_for("http://127.0.0.1:9");
    assert!(client.search("   ").unwrap().is_empty());
}

#[test]
fn http_error_status_is_reported() {
    let (base, server) = serve(vec![http_status(503)]);
    let err = client_for(&base).search("rain").unwrap_err();
    assert!(matches!(err, NetworkError::Status(503)));
    server.join().unwrap();
}

#[test]
fn malformed_json_is_a_decode_error() {
    let (base, server) = serve(vec![http_ok("application/json", b"{not json")]);
    let err = client_for(&base).search("rain").unwrap_err();
    assert!(matches!(err, NetworkError::Decode(_)));
    server.join().unwrap();
}

#[test]
fn api_error_body_is_a_decode_error() {
    let body = br#"{"error": {"code": "badvalue", "info": "Unrecognized value"}}"#;
    let (base, server) = serve(vec![http_ok("application/json", body)]);
    let err = client_for(&base).search("rain").unwrap_err();
    assert!(err.to_string().contains("badvalue"));
    server.join().unwrap();
}

#[test]
fn missing_page_resolves_to_none() {
    let body = br#"{"query": {"pages": {"-1": {"ns": 6, "title": "File:Nope.ogg", "missing": ""}}}}"#;
    let (base, server) = serve(vec![http_ok("application/json", body)]);
    assert_eq!(client_for(&base).resolve_download_url("File:Nope.ogg").unwrap(), None);
    server.join().unwrap();
}

#[test]
fn unreachable_server_is_a_request_error() {
    // Bind then drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let err = client_for(&format!("http://127.0.0.1:{port}"))
        .search("rain")
        .unwrap_err();
    assert!(matches!(err, NetworkError::Request(_)));
}

#[test]
fn download_streams_with_progress_into_place() {
    let body: Vec<u8> = (0..20_000u32).map(|i| (i % 251) as u8).collect();
    let (base, server) = serve(vec![http_ok("audio/ogg", &body)]);
    let dir = tempdir().unwrap();
    let dest = dir.path().join("downloaded_audio");

    let mut seen = Vec::new();
    let file = client_for(&base)
        .download(
            &format!("{base}/commons/a/ab/Rain_%28roof%29.ogg"),
            &dest,
            |p| seen.push(p),
            &CancelToken::new(),
        )
        .unwrap();
    server.join().unwrap();

    assert_eq!(file.file_name(), "Rain_(roof).ogg");
    assert_eq!(file.category, Category::Downloaded);
    assert_eq!(std::fs::read(&file.path).unwrap(), body);
    assert!(!dest.join("Rain_(roof).ogg.part").exists());

    assert_eq!(seen.first().unwrap().downloaded, 0);
    assert!(seen.windows(2).all(|w| w[0].downloaded <= w[1].downloaded));
    let last = seen.last().unwrap();
    assert_eq!(last.downloaded, 20_000);
    assert_eq!(last.total, Some(20_000));
    assert_eq!(last.percent(), Some(100));
}

#[test]
fn cancelled_download_leaves_nothing_behind() {
    let body = vec![7u8; 64 * 1024];
    let (base, server) = serve(vec![http_ok("audio/ogg", &body)]);
    let dir = tempdir().unwrap();

    let cancel = CancelToken::new();
    cancel.cancel();
    let err = client_for(&base)
        .download(&format!("{base}/x/Clip.ogg"), dir.path(), |_| {}, &cancel)
        .unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, DownloadError::Cancelled));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn download_http_error_creates_no_file() {
    let (base, server) = serve(vec![http_status(404)]);
    let dir = tempdir().unwrap();
    let err = client_for(&base)
        .download(&format!("{base}/x/Clip.ogg"), dir.path(), |_| {}, &CancelToken::new())
        .unwrap_err();
    server.join().unwrap();

    assert!(matches!(err, DownloadError::Network(NetworkError::Status(404))));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn file_names_are_decoded_and_contained() {
    assert_eq!(
        file_name_from_url("https://u.example/a/b/Song%20one.mp3?x=1").as_deref(),
        Some("Song one.mp3")
    );
    assert_eq!(
        file_name_from_url("https://u.example/a/%2Fetc%2Fpasswd").as_deref(),
        Some("_etc_passwd")
    );
    assert_eq!(file_name_from_url("https://u.example/a/"), None);
    assert_eq!(file_name_from_url("https://u.example/a/.."), None);
    assert_eq!(file_name_from_url("https://u.example/a/100%"), Some("100%".to_string()));
    assert_eq!(file_name_from_url("https://u.example/a/Rain.ogg#t=3").as_deref(), Some("Rain.ogg"));
    assert_eq!(file_name_from_url("not a url/Rain.ogg"), None);
}

#[test]
fn progress_fraction_needs_a_total() {
    let p = Progress {
        downloaded: 50,
        total: None,
    };
    assert_eq!(p.fraction(), None);
    let p = Progress {
        downloaded: 25,
        total: Some(100),
    };
    assert_eq!(p.percent(), Some(25));
}
