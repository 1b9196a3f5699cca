use crate::rsip_ext::RsipDialogExt;
use crate::Result;

/// Correlation identity of a SIP message.
///
/// A fully established dialog is named by Call-ID plus both tags. Before the
/// To-tag exists the key degrades to Call-ID plus the top-most Via branch of
/// the transaction, so both are carried here and the ledger decides which part
/// to match on.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct DialogKey {
    pub call_id: String,
    pub from_tag: Option<String>,
    pub to_tag: Option<String>,
    pub branch: Option<String>,
}

impl DialogKey {
    pub fn new(call_id: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            ..Default::default()
        }
    }

    pub fn with_from_tag(mut self, tag: impl Into<String>) -> Self {
        self.from_tag = Some(tag.into());
        self
    }

    pub fn with_to_tag(mut self, tag: impl Into<String>) -> Self {
        self.to_tag = Some(tag.into());
        self
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Both tags are known.
    pub fn is_established(&self) -> bool {
        self.from_tag.is_some() && self.to_tag.is_some()
    }

    /// The message carries exactly the tag pair `{a, b}`, in either order.
    /// Requests sent by the callee swap From and To.
    pub fn has_tag_pair(&self, a: &str, b: &str) -> bool {
        match (self.from_tag.as_deref(), self.to_tag.as_deref()) {
            (Some(from), Some(to)) => (from == a && to == b) || (from == b && to == a),
            _ => false,
        }
    }

    /// The tag belonging to the other side of `local`, if `local` is one of
    /// the two tags in this key.
    pub fn peer_tag_of(&self, local: &str) -> Option<&str> {
        match (self.from_tag.as_deref(), self.to_tag.as_deref()) {
            (Some(from), Some(to)) if from == local => Some(to),
            (Some(from), Some(to)) if to == local => Some(from),
            _ => None,
        }
    }
}

impl std::fmt::Display for DialogKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.from_tag, &self.to_tag) {
            (Some(from), Some(to)) => write!(f, "{} {}/{}", self.call_id, from, to),
            _ => write!(
                f,
                "{}({})",
                self.call_id,
                self.branch.as_deref().unwrap_or("-")
            ),
        }
    }
}

impl TryFrom<&rsip::Request> for DialogKey {
    type Error = crate::error::Error;

    fn try_from(req: &rsip::Request) -> Result<Self> {
        Ok(DialogKey {
            call_id: req.call_id_value()?,
            from_tag: req.from_tag_value(),
            to_tag: req.to_tag_value(),
            branch: req.top_via_branch(),
        })
    }
}

impl TryFrom<&rsip::Response> for DialogKey {
    type Error = crate::error::Error;

    fn try_from(resp: &rsip::Response) -> Result<Self> {
        Ok(DialogKey {
            call_id: resp.call_id_value()?,
            from_tag: resp.from_tag_value(),
            to_tag: resp.to_tag_value(),
            branch: resp.top_via_branch(),
        })
    }
}

impl TryFrom<&rsip::SipMessage> for DialogKey {
    type Error = crate::error::Error;

    fn try_from(msg: &rsip::SipMessage) -> Result<Self> {
        match msg {
            rsip::SipMessage::Request(req) => DialogKey::try_from(req),
            rsip::SipMessage::Response(resp) => DialogKey::try_from(resp),
        }
    }
}

#[test]
fn test_dialog_key() -> Result<()> {
    use rsip::headers::*;
    let invite_req = rsip::Request {
        method: rsip::Method::Invite,
        uri: rsip::Uri::try_from("sip:bob@biloxi.example.com")?,
        headers: vec![
            Via::new("SIP/2.0/UDP pc33.atlanta.example.com;branch=z9hG4bK776asdhds").into(),
            CSeq::new("314159 INVITE").into(),
            From::new("Alice <sip:alice@atlanta.example.com>;tag=1928301774").into(),
            To::new("Bob <sip:bob@biloxi.example.com>").into(),
            CallId::new("a84b4c76e66710@pc33.atlanta.example.com").into(),
        ]
        .into(),
        version: rsip::Version::V2,
        body: Default::default(),
    };
    let key = DialogKey::try_from(&invite_req)?;
    assert_eq!(
        key,
        DialogKey::new("a84b4c76e66710@pc33.atlanta.example.com")
            .with_from_tag("1928301774")
            .with_branch("z9hG4bK776asdhds")
    );
    assert!(!key.is_established());
    assert_eq!(
        key.to_string(),
        "a84b4c76e66710@pc33.atlanta.example.com(z9hG4bK776asdhds)"
    );

    let ok_resp = rsip::Response {
        status_code: rsip::StatusCode::OK,
        version: rsip::Version::V2,
        headers: vec![
            Via::new("SIP/2.0/UDP pc33.atlanta.example.com;branch=z9hG4bK776asdhds").into(),
            CSeq::new("314159 INVITE").into(),
            From::new("Alice <sip:alice@atlanta.example.com>;tag=1928301774").into(),
            To::new("Bob <sip:bob@biloxi.example.com>;tag=a6c85cf").into(),
            CallId::new("a84b4c76e66710@pc33.atlanta.example.com").into(),
        ]
        .into(),
        body: Default::default(),
    };
    let key = DialogKey::try_from(&rsip::SipMessage::Response(ok_resp))?;
    assert!(key.is_established());
    assert!(key.has_tag_pair("a6c85cf", "1928301774"));
    assert!(!key.has_tag_pair("a6c85cf", "other"));
    assert_eq!(key.peer_tag_of("1928301774"), Some("a6c85cf"));
    assert_eq!(key.peer_tag_of("a6c85cf"), Some("1928301774"));
    assert_eq!(key.peer_tag_of("nobody"), None);
    assert_eq!(
        key.to_string(),
        "a84b4c76e66710@pc33.atlanta.example.com 1928301774/a6c85cf"
    );

    let mut no_call_id = invite_req.clone();
    no_call_id
        .headers
        .retain(|h| !matches!(h, rsip::Header::CallId(_)));
    assert!(DialogKey::try_from(&no_call_id).is_err());
    Ok(())
}
