//! Writing replies to tiny_http requests.

use anyhow::Result;
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::route::Reply;

/// Send `reply`, omitting the body for HEAD requests.
pub fn send(request: Request, reply: Reply) -> Result<()> {
    let head = is_head_request(&request);
    let Reply {
        status,
        content_type,
        headers,
        body,
    } = reply;

    let body = if head { Vec::new() } else { body };
    let mut response = Response::from_data(body).with_status_code(StatusCode(status));
    add_header(&mut response, "Content-Type", content_type);
    for (name, value) in &headers {
        add_header(&mut response, name, value);
    }

    request.respond(response)?;
    Ok(())
}

/// Respond with 405 for anything but GET and HEAD.
pub fn respond_method_not_allowed(request: Request) -> Result<()> {
    let mut response = Response::from_string("405 Method Not Allowed").with_status_code(StatusCode(405));
    add_header(&mut response, "Allow", "GET, HEAD");
    request.respond(response)?;
    Ok(())
}

/// Value of the `If-None-Match` request header.
pub fn if_none_match(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("If-None-Match"))
        .map(|h| h.value.to_string())
}

pub fn is_read_request(request: &Request) -> bool {
    matches!(request.method(), Method::Get | Method::Head)
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn add_header<R: std::io::Read>(response: &mut Response<R>, name: &str, value: &str) {
    match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
        Ok(header) => response.add_header(header),
        Err(()) => crate::debug!("serve"; "invalid header {}: {}", name, value),
    }
}
