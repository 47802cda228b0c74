use http::{Method, Version};

use crate::encode::USER_AGENT;
use crate::pipe::test::MockTransport;
use crate::{
    Body, Error, Pipe, Query, RequestOptions, ResponseHooks, State, StatusLine, StreamMode, Target,
};

fn pipe_over(response: &[u8]) -> (Pipe, std::rc::Rc<std::cell::RefCell<super::Recorder>>) {
    let (t, rec) = MockTransport::new(response);
    (Pipe::new(Box::new(t)), rec)
}

#[test]
fn end_to_end_get() {
    let (mut pipe, rec) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ntest");

    let opts = RequestOptions::new()
        .path("/foo")
        .query(Query::Pairs(vec![("x".into(), "1".into())]))
        .header("Host", "h");

    let response = pipe
        .request(&Target::new("h"), opts)
        .unwrap()
        .expect("buffered mode yields a response");

    assert_eq!(response.status_code().map(|s| s.as_u16()), Some(200));
    assert_eq!(response.headers.get("Content-Length"), Some("4"));
    assert_eq!(response.body, b"test");
    assert!(response.eof);

    let sent = String::from_utf8(rec.borrow().sent.clone()).unwrap();
    assert_eq!(
        sent,
        format!(
            "GET /foo?x=1 HTTP/1.1\r\nHost: h\r\nUser-Agent: {}\r\nAccept: */*\r\n\r\n",
            USER_AGENT
        )
    );
}

#[test]
fn multi_valued_response_headers_are_collected() {
    let (mut pipe, _) = pipe_over(
        b"HTTP/1.1 200 OK\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2\r\nContent-Length: 0\r\n\r\n",
    );

    let response = pipe
        .request(&Target::new("h"), RequestOptions::new())
        .unwrap()
        .unwrap();

    assert_eq!(response.headers.get_all("Set-Cookie"), ["a=1", "b=2"]);
}

#[test]
fn interim_100_is_never_the_final_status() {
    let (mut pipe, _) = pipe_over(
        b"HTTP/1.1 100 Continue\r\n\r\nHTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n",
    );

    let response = pipe
        .request(&Target::new("h"), RequestOptions::new())
        .unwrap()
        .unwrap();

    assert_eq!(response.status_code().map(|s| s.as_u16()), Some(200));
}

#[test]
fn malformed_status_line_reaches_the_caller_as_data() {
    let (mut pipe, _) = pipe_over(b"ICY 200 OK\r\nContent-Length: 2\r\n\r\nhi");

    let response = pipe
        .request(&Target::new("h"), RequestOptions::new())
        .unwrap()
        .unwrap();

    assert_eq!(
        response.status,
        StatusLine::Malformed("ICY 200 OK".to_string())
    );
    assert_eq!(response.status_code(), None);
    // header and body parsing still ran
    assert_eq!(response.body, b"hi");
}

#[test]
fn literal_body_is_sent_after_the_head() {
    let (mut pipe, rec) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");

    let opts = RequestOptions::new()
        .method(Method::POST)
        .body(Body::Bytes(b"hallo".to_vec()));

    pipe.request(&Target::new("h"), opts).unwrap().unwrap();

    let sent = String::from_utf8(rec.borrow().sent.clone()).unwrap();
    assert!(sent.contains("Content-Length: 5\r\n"));
    assert!(sent.ends_with("\r\n\r\nhallo"));
}

#[test]
fn producer_body_sends_until_budget() {
    let (mut pipe, rec) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");

    let mut chunks = vec![b"hal".to_vec(), b"lo!!!".to_vec()].into_iter();
    let opts = RequestOptions::new()
        .method(Method::POST)
        .header("Content-Length", "5")
        .body(Body::Producer(Box::new(move || chunks.next())));

    pipe.request(&Target::new("h"), opts).unwrap().unwrap();

    let sent = String::from_utf8(rec.borrow().sent.clone()).unwrap();
    // the second chunk is cut at the declared length
    assert!(sent.ends_with("\r\n\r\nhallo"));
}

#[test]
fn producer_shortfall_sends_what_was_yielded() {
    let (mut pipe, rec) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n");

    let mut chunks = vec![b"ha".to_vec()].into_iter();
    let opts = RequestOptions::new()
        .method(Method::POST)
        .header("Content-Length", "5")
        .body(Body::Producer(Box::new(move || chunks.next())));

    pipe.request(&Target::new("h"), opts).unwrap().unwrap();

    let sent = String::from_utf8(rec.borrow().sent.clone()).unwrap();
    assert!(sent.ends_with("\r\n\r\nha"));
}

#[test]
fn pass_through_returns_without_reading() {
    let (mut pipe, _) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ntest");

    let result = pipe
        .request(
            &Target::new("h"),
            RequestOptions::new().stream(StreamMode::PassThrough),
        )
        .unwrap();

    assert!(result.is_none());
    assert_eq!(pipe.state(), State::Begin);

    // the caller drives the reads from here
    let response = pipe.response().unwrap();
    assert_eq!(response.status_code().map(|s| s.as_u16()), Some(200));
    assert_eq!(response.body, b"test");
}

#[test]
fn body_pass_through_stops_at_header_end() {
    let (mut pipe, rec) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ntest");

    let response = pipe
        .request(
            &Target::new("h"),
            RequestOptions::new().stream(StreamMode::BodyPassThrough),
        )
        .unwrap()
        .unwrap();

    assert_eq!(response.status_code().map(|s| s.as_u16()), Some(200));
    assert!(response.body.is_empty());
    assert!(!response.eof);
    assert_eq!(pipe.state(), State::ReadingBody);

    // manual body reads take over
    assert_eq!(pipe.read_body().unwrap(), Some(b"test".to_vec()));
    assert_eq!(pipe.read_body().unwrap(), None);
    assert!(pipe.is_eof());
    assert_eq!(rec.borrow().releases, 1);
}

#[test]
fn header_filter_stops_the_drain() {
    let (mut pipe, _) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ntest");

    let dispatched = pipe
        .request(
            &Target::new("h"),
            RequestOptions::new().stream(StreamMode::PassThrough),
        )
        .unwrap();
    assert!(dispatched.is_none());

    let mut seen_status = None;
    let mut filter = |status: &StatusLine, headers: &crate::Headers| {
        seen_status = match status {
            StatusLine::Status(code) => Some(code.as_u16()),
            StatusLine::Malformed(_) => None,
        };
        headers.contains("Content-Length")
    };

    let response = pipe
        .response_with(ResponseHooks {
            header_filter: Some(&mut filter),
            body_filter: None,
        })
        .unwrap();

    assert!(!response.eof);
    assert!(response.body.is_empty());
    assert_eq!(seen_status, Some(200));
}

#[test]
fn body_filter_consumes_chunks() {
    let (mut pipe, _) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ntest");

    let dispatched = pipe
        .request(
            &Target::new("h"),
            RequestOptions::new().stream(StreamMode::PassThrough),
        )
        .unwrap();
    assert!(dispatched.is_none());

    let mut collected = Vec::new();
    let mut filter = |chunk: &[u8]| {
        collected.extend_from_slice(chunk);
        false
    };

    let response = pipe
        .response_with(ResponseHooks {
            header_filter: None,
            body_filter: Some(&mut filter),
        })
        .unwrap();

    // filtered chunks are not buffered
    assert!(response.body.is_empty());
    assert!(response.eof);
    assert_eq!(collected, b"test");
}

#[test]
fn body_filter_can_stop_early() {
    let (t, _) = MockTransport::new(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ntest");
    let mut pipe = Pipe::new(Box::new(t)).with_chunk_size(2);

    let dispatched = pipe
        .request(
            &Target::new("h"),
            RequestOptions::new().stream(StreamMode::PassThrough),
        )
        .unwrap();
    assert!(dispatched.is_none());

    let mut filter = |_: &[u8]| true;
    let response = pipe
        .response_with(ResponseHooks {
            header_filter: None,
            body_filter: Some(&mut filter),
        })
        .unwrap();

    assert!(!response.eof);
    // half the body is still unread
    assert_eq!(pipe.read_body().unwrap(), Some(b"st".to_vec()));
}

#[test]
fn read_body_before_body_state_is_misuse() {
    let (mut pipe, _) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ntest");

    let dispatched = pipe
        .request(
            &Target::new("h"),
            RequestOptions::new().stream(StreamMode::PassThrough),
        )
        .unwrap();
    assert!(dispatched.is_none());

    assert_eq!(pipe.read_body().unwrap_err(), Error::BadState(State::Begin));
}

#[test]
fn invalid_version_is_rejected() {
    let (mut pipe, _) = pipe_over(b"");

    let err = pipe
        .request(
            &Target::new("h"),
            RequestOptions::new().version(Version::HTTP_2),
        )
        .unwrap_err();

    assert_eq!(err, Error::InvalidVersion(Version::HTTP_2));
}

#[test]
fn invalid_target_is_rejected() {
    let (mut pipe, _) = pipe_over(b"");

    let err = pipe
        .request(&Target::new(""), RequestOptions::new())
        .unwrap_err();

    assert!(matches!(err, Error::InvalidTarget(_)));
}

#[test]
fn head_request_response_has_no_body() {
    let (mut pipe, _) = pipe_over(b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\n");

    let response = pipe
        .request(
            &Target::new("h"),
            RequestOptions::new().method(Method::HEAD),
        )
        .unwrap()
        .unwrap();

    assert_eq!(response.status_code().map(|s| s.as_u16()), Some(200));
    assert!(response.body.is_empty());
    assert!(response.eof);
}

#[test]
fn chunked_end_to_end() {
    let (mut pipe, rec) = pipe_over(
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n4\r\ntest\r\n0\r\n\r\n",
    );

    let response = pipe
        .request(&Target::new("h"), RequestOptions::new())
        .unwrap()
        .unwrap();

    assert_eq!(response.body, b"test");
    assert!(response.eof);
    assert_eq!(rec.borrow().releases, 1);
}
