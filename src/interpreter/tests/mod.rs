use rsip::{headers::*, Request, Response, StatusCode};


pub(super) const CALL_ID: &str = "a84b4c76e66710@pc33.atlanta.example.com";
pub(super) const ALICE_TAG: &str = "1928301774";
pub(super) const BOB_TAG: &str = "a6c85cf";
pub(super) const INVITE_BRANCH: &str = "z9hG4bK776asdhds";

/// Test helper to create a request from Alice to Bob
pub(super) fn create_request(
    method: rsip::Method,
    cseq: &str,
    branch: &str,
    to_tag: Option<&str>,
) -> Request {
    let to = match to_tag {
        Some(tag) => format!("Bob <sip:bob@biloxi.example.com>;tag={}", tag),
        None => "Bob <sip:bob@biloxi.example.com>".to_string(),
    };
    Request {
        method,
        uri: rsip::Uri::try_from("sip:bob@biloxi.example.com").unwrap(),
        headers: vec![
            Via::new(&format!(
                "SIP/2.0/UDP pc33.atlanta.example.com;branch={}",
                branch
            ))
            .into(),
            MaxForwards::new("70").into(),
            To::new(&to).into(),
            From::new(&format!(
                "Alice <sip:alice@atlanta.example.com>;tag={}",
                ALICE_TAG
            ))
            .into(),
            CallId::new(CALL_ID).into(),
            CSeq::new(cseq).into(),
        ]
        .into(),
        version: rsip::Version::V2,
        body: Default::default(),
    }
}

/// Test helper to create a response to Alice's INVITE transaction
pub(super) fn create_response(status: u16, cseq: &str, to_tag: Option<&str>) -> Response {
    let to = match to_tag {
        Some(tag) => format!("Bob <sip:bob@biloxi.example.com>;tag={}", tag),
        None => "Bob <sip:bob@biloxi.example.com>".to_string(),
    };
    Response {
        status_code: StatusCode::from(status),
        version: rsip::Version::V2,
        headers: vec![
            Via::new(&format!(
                "SIP/2.0/UDP pc33.atlanta.example.com;branch={}",
                INVITE_BRANCH
            ))
            .into(),
            To::new(&to).into(),
            From::new(&format!(
                "Alice <sip:alice@atlanta.example.com>;tag={}",
                ALICE_TAG
            ))
            .into(),
            CallId::new(CALL_ID).into(),
            CSeq::new(cseq).into(),
        ]
        .into(),
        body: Default::default(),
    }
}
