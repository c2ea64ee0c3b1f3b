//
// Copyright (c) The Meshsim Contributors
//
// SPDX-License-Identifier: MIT
//

use chrono::{NaiveDateTime, Utc};
use meshsim_packet::segment::SegmentFlags;
use rand::Rng;

use crate::store::{Resource, ResourceStore};

// RFC-1123 date format used by `If-Modified-Since` and `last_modified`.
pub const DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

// A parsed HTTP request.
#[derive(Debug, Eq, PartialEq)]
pub struct Request {
    pub method: String,
    pub resource: String,
    pub if_modified_since: Option<String>,
    pub body: String,
}

// A formatted HTTP response together with the transport flags its
// segments are sent under. Data responses carry ACK|PSH (the last segment
// gets the FIN promotion); error responses are terminal and carry ACK|FIN
// on every segment.
#[derive(Debug, Eq, PartialEq)]
pub struct Response {
    pub data: String,
    pub flags: SegmentFlags,
}

// ===== impl Request =====

impl Request {
    // Parse a reassembled request: request line, then headers, with the
    // POST body in the last line.
    pub fn parse(request: &str) -> Option<Request> {
        let lines: Vec<&str> = request.split("\r\n").collect();

        let mut request_line = lines.first()?.split_whitespace();
        let method = request_line.next()?.to_owned();
        let resource = request_line.next()?.to_owned();

        let if_modified_since = lines[1..].iter().find_map(|line| {
            line.strip_prefix("If-Modified-Since:")
                .map(|value| value.trim().to_owned())
        });

        let body = lines.last().copied().unwrap_or_default().to_owned();

        Some(Request {
            method,
            resource,
            if_modified_since,
            body,
        })
    }
}

// ===== impl Response =====

impl Response {
    fn bad_request() -> Response {
        Response {
            data: "HTTP/1.1 400 Bad Request\r\n\r\nInvalid Request".to_owned(),
            flags: SegmentFlags::ACK | SegmentFlags::FIN,
        }
    }

    fn not_found() -> Response {
        Response {
            data: "HTTP/1.1 404 Not Found\r\n\r\nResource Not Found".to_owned(),
            flags: SegmentFlags::ACK | SegmentFlags::FIN,
        }
    }

    fn not_modified() -> Response {
        Response {
            data: "HTTP/1.1 304 Not Modified\r\n\r\n".to_owned(),
            flags: SegmentFlags::ACK | SegmentFlags::PSH,
        }
    }

    fn ok(resource: &Resource) -> Response {
        Response {
            data: format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\n\r\n{}",
                resource.data.len(),
                resource.data
            ),
            flags: SegmentFlags::ACK | SegmentFlags::PSH,
        }
    }

    fn created() -> Response {
        Response {
            data: "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n\
                   POST request successfully received.\r\n\r\n"
                .to_owned(),
            flags: SegmentFlags::ACK | SegmentFlags::PSH,
        }
    }
}

// ===== global functions =====

// Process a reassembled request against the resource store and produce
// the response to stream back.
pub fn handle_request(store: &mut ResourceStore, request: &str) -> Response {
    let Some(request) = Request::parse(request) else {
        return Response::bad_request();
    };

    match request.method.as_str() {
        "GET" => handle_get(store, &request),
        "POST" => handle_post(store, &request),
        _ => Response::bad_request(),
    }
}

fn handle_get(store: &ResourceStore, request: &Request) -> Response {
    // Look the resource up before touching any of its metadata.
    let Some(resource) = store.get(&request.resource) else {
        return Response::not_found();
    };

    if let Some(modified_since) = &request.if_modified_since
        && let Ok(modified_since) =
            NaiveDateTime::parse_from_str(modified_since, DATE_FORMAT)
        && let Ok(last_modified) =
            NaiveDateTime::parse_from_str(&resource.last_modified, DATE_FORMAT)
        && last_modified <= modified_since
    {
        return Response::not_modified();
    }

    Response::ok(resource)
}

fn handle_post(store: &mut ResourceStore, request: &Request) -> Response {
    // Never clobber an existing resource: move the upload to a fresh key
    // and carry that key through to the insert.
    let mut name = request.resource.clone();
    if store.contains(&name) {
        name = "/new_resource.html".to_owned();
        let mut suffix = 2;
        while store.contains(&name) {
            name = format!("/new_resource{}.html", suffix);
            suffix += 1;
        }
    }

    let resource = Resource {
        last_modified: Utc::now().format(DATE_FORMAT).to_string(),
        file_size: request.body.len(),
        etag: new_etag(),
        data: request.body.clone(),
    };
    if let Err(error) = store.put(&name, resource) {
        error.log();
    }

    Response::created()
}

// A random 6-character entity tag: three lowercase letters followed by
// three digits.
fn new_etag() -> String {
    let mut rng = rand::rng();
    let mut etag = String::with_capacity(6);
    for _ in 0..3 {
        etag.push(rng.random_range(b'a'..=b'z') as char);
    }
    for _ in 0..3 {
        etag.push(char::from_digit(rng.random_range(0..10), 10).unwrap());
    }

    etag
}

// ===== tests =====

#[cfg(test)]
mod tests {
    use maplit::btreemap;
    use pretty_assertions::assert_eq;

    use super::*;

    fn store() -> ResourceStore {
        ResourceStore::memory(btreemap! {
            "/a".to_owned() => Resource {
                last_modified: "Wed, 21 Oct 2020 07:28:00 GMT".to_owned(),
                file_size: 11,
                etag: "xyz789".to_owned(),
                data: "hello world".to_owned(),
            },
        })
    }

    #[test]
    fn parse_get_request() {
        let request = Request::parse(
            "GET /a HTTP/1.1\r\nHost: s\r\n\
             If-Modified-Since: Wed, 21 Oct 2020 07:28:00 GMT\r\n\r\n",
        )
        .unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.resource, "/a");
        assert_eq!(
            request.if_modified_since.as_deref(),
            Some("Wed, 21 Oct 2020 07:28:00 GMT")
        );
    }

    #[test]
    fn get_ok() {
        let response = handle_request(
            &mut store(),
            "GET /a HTTP/1.1\r\nHost: s\r\n\r\n",
        );
        assert_eq!(
            response.data,
            "HTTP/1.1 200 OK\r\nContent-Length: 11\r\n\r\nhello world"
        );
        assert_eq!(response.flags, SegmentFlags::ACK | SegmentFlags::PSH);
    }

    #[test]
    fn get_not_modified() {
        // Timestamp equal to last_modified: not modified.
        let response = handle_request(
            &mut store(),
            "GET /a HTTP/1.1\r\nHost: s\r\n\
             If-Modified-Since: Wed, 21 Oct 2020 07:28:00 GMT\r\n\r\n",
        );
        assert_eq!(response.data, "HTTP/1.1 304 Not Modified\r\n\r\n");
        assert_eq!(response.flags, SegmentFlags::ACK | SegmentFlags::PSH);

        // Older timestamp: the resource changed since, serve it.
        let response = handle_request(
            &mut store(),
            "GET /a HTTP/1.1\r\nHost: s\r\n\
             If-Modified-Since: Wed, 21 Oct 2015 07:28:00 GMT\r\n\r\n",
        );
        assert!(response.data.starts_with("HTTP/1.1 200 OK"));
    }

    #[test]
    fn not_modified_fin_promotion() {
        use crate::gbn::{GbnSender, HDR_OVERHEAD};

        // A 304 is a data response: its single segment goes out with the
        // FIN promotion applied.
        let response = handle_request(
            &mut store(),
            "GET /a HTTP/1.1\r\nHost: s\r\n\
             If-Modified-Since: Wed, 21 Oct 2020 07:28:00 GMT\r\n\r\n",
        );
        let mut sender =
            GbnSender::new(&response.data, 1024 - HDR_OVERHEAD, 4, 1, None)
                .with_flags(response.flags);

        let burst = sender.take_burst();
        assert_eq!(burst.len(), 1);
        assert_eq!(
            burst[0].flags,
            SegmentFlags::ACK | SegmentFlags::PSH | SegmentFlags::FIN
        );
    }

    #[test]
    fn get_not_found() {
        let response = handle_request(
            &mut store(),
            "GET /missing HTTP/1.1\r\nHost: s\r\n\r\n",
        );
        assert_eq!(
            response.data,
            "HTTP/1.1 404 Not Found\r\n\r\nResource Not Found"
        );
        assert_eq!(response.flags, SegmentFlags::ACK | SegmentFlags::FIN);
    }

    #[test]
    fn bad_method() {
        let response = handle_request(
            &mut store(),
            "DELETE /a HTTP/1.1\r\nHost: s\r\n\r\n",
        );
        assert_eq!(
            response.data,
            "HTTP/1.1 400 Bad Request\r\n\r\nInvalid Request"
        );
        assert_eq!(response.flags, SegmentFlags::ACK | SegmentFlags::FIN);
    }

    #[test]
    fn post_stores_resource() {
        let mut store = store();
        let response = handle_request(
            &mut store,
            "POST /b HTTP/1.1\r\nHost: s\r\nContent-Length: 6\r\n\r\nupload",
        );
        assert!(response.data.starts_with("HTTP/1.1 200 OK"));
        assert_eq!(response.flags, SegmentFlags::ACK | SegmentFlags::PSH);

        let resource = store.get("/b").unwrap();
        assert_eq!(resource.data, "upload");
        assert_eq!(resource.file_size, 6);
        assert_eq!(resource.etag.len(), 6);
        assert!(resource.etag[..3].bytes().all(|b| b.is_ascii_lowercase()));
        assert!(resource.etag[3..].bytes().all(|b| b.is_ascii_digit()));
        assert!(
            NaiveDateTime::parse_from_str(&resource.last_modified, DATE_FORMAT)
                .is_ok()
        );
    }

    #[test]
    fn post_collision_is_renamed() {
        let mut store = store();
        handle_request(
            &mut store,
            "POST /a HTTP/1.1\r\nHost: s\r\nContent-Length: 3\r\n\r\nnew",
        );

        // The original resource is untouched; the upload landed elsewhere.
        assert_eq!(store.get("/a").unwrap().data, "hello world");
        assert_eq!(store.get("/new_resource.html").unwrap().data, "new");
    }
}
