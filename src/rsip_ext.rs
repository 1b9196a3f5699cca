use crate::{Error, Result};
use rsip::prelude::{HeadersExt, ToTypedHeader, UntypedHeader};

/// Read access to the headers that correlate a SIP message with a dialog.
///
/// Only `Call-ID` is mandatory. Tags and the Via branch are optional because
/// RFC 2543 peers and early-dialog messages routinely omit them; an absent or
/// empty value is reported as `None`.
pub trait RsipDialogExt {
    fn call_id_value(&self) -> Result<String>;
    fn from_tag_value(&self) -> Option<String>;
    fn to_tag_value(&self) -> Option<String>;
    /// Branch parameter of the top-most Via header.
    fn top_via_branch(&self) -> Option<String>;
    /// Method named by the CSeq header.
    fn cseq_method(&self) -> Result<rsip::Method>;
}

impl<T: HeadersExt> RsipDialogExt for T {
    fn call_id_value(&self) -> Result<String> {
        let call_id = self.call_id_header()?.value().trim().to_string();
        if call_id.is_empty() {
            return Err(Error::MissingHeader("Call-ID"));
        }
        Ok(call_id)
    }

    fn from_tag_value(&self) -> Option<String> {
        let tag = self.from_header().ok()?.tag().ok()??;
        non_empty(tag.to_string())
    }

    fn to_tag_value(&self) -> Option<String> {
        let tag = self.to_header().ok()?.tag().ok()??;
        non_empty(tag.to_string())
    }

    fn top_via_branch(&self) -> Option<String> {
        let via = self.via_header().ok()?.typed().ok()?;
        via.branch().and_then(|b| non_empty(b.to_string()))
    }

    fn cseq_method(&self) -> Result<rsip::Method> {
        Ok(self.cseq_header()?.method()?)
    }
}

fn non_empty(value: String) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Decode a raw SIP message the way the transport layer would hand it over.
pub fn parse_sip_message(raw: &[u8]) -> Result<rsip::SipMessage> {
    let undecoded = std::str::from_utf8(raw)?;
    if undecoded.trim().is_empty() {
        return Err(Error::Error("empty message".to_string()));
    }
    Ok(rsip::SipMessage::try_from(undecoded)?)
}

#[test]
fn test_dialog_headers_ext() -> Result<()> {
    use rsip::headers::*;
    let bye_req = rsip::Request {
        method: rsip::Method::Bye,
        uri: rsip::Uri::try_from("sip:alice@pc33.atlanta.example.com")?,
        headers: vec![
            Via::new("SIP/2.0/UDP 192.0.2.4;branch=z9hG4bKnashds10").into(),
            Via::new("SIP/2.0/UDP 192.0.2.9;branch=z9hG4bKouter").into(),
            CSeq::new("231 BYE").into(),
            From::new("Bob <sip:bob@biloxi.example.com>;tag=a6c85cf").into(),
            To::new("Alice <sip:alice@atlanta.example.com>;tag=1928301774").into(),
            CallId::new(" a84b4c76e66710@pc33.atlanta.example.com ").into(),
        ]
        .into(),
        version: rsip::Version::V2,
        body: Default::default(),
    };
    assert_eq!(
        bye_req.call_id_value()?,
        "a84b4c76e66710@pc33.atlanta.example.com"
    );
    assert_eq!(bye_req.from_tag_value().as_deref(), Some("a6c85cf"));
    assert_eq!(bye_req.to_tag_value().as_deref(), Some("1928301774"));
    assert_eq!(bye_req.top_via_branch().as_deref(), Some("z9hG4bKnashds10"));
    assert_eq!(bye_req.cseq_method()?, rsip::Method::Bye);

    let mut bare = bye_req.clone();
    bare.headers = vec![CallId::new("").into()].into();
    assert_eq!(bare.call_id_value(), Err(Error::MissingHeader("Call-ID")));
    assert_eq!(bare.from_tag_value(), None);
    assert_eq!(bare.top_via_branch(), None);
    assert!(bare.cseq_method().is_err());
    Ok(())
}

#[test]
fn test_parse_sip_message() {
    let raw = "OPTIONS sip:carol@chicago.example.com SIP/2.0\r\n\
               Via: SIP/2.0/UDP pc33.atlanta.example.com;branch=z9hG4bKhjhs8ass877\r\n\
               Max-Forwards: 70\r\n\
               To: <sip:carol@chicago.example.com>\r\n\
               From: Alice <sip:alice@atlanta.example.com>;tag=1928301774\r\n\
               Call-ID: a84b4c76e66710\r\n\
               CSeq: 63104 OPTIONS\r\n\
               Content-Length: 0\r\n\r\n";
    let msg = parse_sip_message(raw.as_bytes()).expect("parse options");
    assert!(matches!(msg, rsip::SipMessage::Request(_)));

    assert!(parse_sip_message(b"").is_err());
    assert!(parse_sip_message(&[0xff, 0xfe, 0x00]).is_err());
}
