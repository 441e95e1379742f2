// URL Lexer
//
// Splits a raw URL into borrowed components. Tokenizing never fails:
// anything that cannot be recognized is simply absent, and the classifier
// treats the absence as a finding.

use crate::encoding::{ascii_lowercase, percent_decode};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// The URL field a component or finding refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UrlField {
    /// The URL as a whole
    Url,
    Scheme,
    UserInfo,
    Host,
    Port,
    Path,
    Query,
    Fragment,
}

impl fmt::Display for UrlField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlField::Url => write!(f, "url"),
            UrlField::Scheme => write!(f, "scheme"),
            UrlField::UserInfo => write!(f, "userinfo"),
            UrlField::Host => write!(f, "host"),
            UrlField::Port => write!(f, "port"),
            UrlField::Path => write!(f, "path"),
            UrlField::Query => write!(f, "query"),
            UrlField::Fragment => write!(f, "fragment"),
        }
    }
}

/// One present URL field: raw slice plus decoded and comparison forms
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component<'a> {
    raw: &'a str,
    offset: usize,
    decoded: Cow<'a, str>,
    lowercase: Option<Cow<'a, str>>,
}

impl<'a> Component<'a> {
    fn new(raw: &'a str, offset: usize) -> Self {
        Self {
            raw,
            offset,
            decoded: percent_decode(raw),
            lowercase: None,
        }
    }

    // Scheme and host are compared case-insensitively
    fn with_lowercase(raw: &'a str, offset: usize) -> Self {
        let decoded = percent_decode(raw);
        let lowercase = Some(ascii_lowercase(decoded.clone()));
        Self {
            raw,
            offset,
            decoded,
            lowercase,
        }
    }

    /// Text exactly as it appeared in the URL
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// Byte offset of the first character in the raw URL
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Byte offset one past the last character
    pub fn end(&self) -> usize {
        self.offset + self.raw.len()
    }

    /// Percent-decoded form (single pass)
    pub fn decoded(&self) -> &str {
        &self.decoded
    }

    /// Form used for comparisons: lowercased decoded text for scheme and
    /// host, decoded text otherwise
    pub fn normalized(&self) -> &str {
        self.lowercase.as_deref().unwrap_or(&self.decoded)
    }

    /// True if decoding changed the text
    pub fn is_encoded(&self) -> bool {
        self.decoded.as_ref() != self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }
}

/// Structural view over a raw URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlComponents<'a> {
    raw: &'a str,
    scheme: Option<Component<'a>>,
    authority: Option<Component<'a>>,
    userinfo: Option<Component<'a>>,
    host: Option<Component<'a>>,
    port: Option<Component<'a>>,
    path: Option<Component<'a>>,
    query: Option<Component<'a>>,
    fragment: Option<Component<'a>>,
}

impl<'a> UrlComponents<'a> {
    fn empty(raw: &'a str) -> Self {
        Self {
            raw,
            scheme: None,
            authority: None,
            userinfo: None,
            host: None,
            port: None,
            path: None,
            query: None,
            fragment: None,
        }
    }

    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn scheme(&self) -> Option<&Component<'a>> {
        self.scheme.as_ref()
    }

    /// Everything between `//` and the path, including user-info and port
    pub fn authority(&self) -> Option<&Component<'a>> {
        self.authority.as_ref()
    }

    pub fn userinfo(&self) -> Option<&Component<'a>> {
        self.userinfo.as_ref()
    }

    pub fn host(&self) -> Option<&Component<'a>> {
        self.host.as_ref()
    }

    pub fn port(&self) -> Option<&Component<'a>> {
        self.port.as_ref()
    }

    pub fn path(&self) -> Option<&Component<'a>> {
        self.path.as_ref()
    }

    pub fn query(&self) -> Option<&Component<'a>> {
        self.query.as_ref()
    }

    pub fn fragment(&self) -> Option<&Component<'a>> {
        self.fragment.as_ref()
    }

    /// Component for a field; `UrlField::Url` has no component
    pub fn field(&self, field: UrlField) -> Option<&Component<'a>> {
        match field {
            UrlField::Url => None,
            UrlField::Scheme => self.scheme(),
            UrlField::UserInfo => self.userinfo(),
            UrlField::Host => self.host(),
            UrlField::Port => self.port(),
            UrlField::Path => self.path(),
            UrlField::Query => self.query(),
            UrlField::Fragment => self.fragment(),
        }
    }

    /// Present fields in URL order
    pub fn fields(&self) -> impl Iterator<Item = (UrlField, &Component<'a>)> {
        [
            UrlField::Scheme,
            UrlField::UserInfo,
            UrlField::Host,
            UrlField::Port,
            UrlField::Path,
            UrlField::Query,
            UrlField::Fragment,
        ]
        .into_iter()
        .filter_map(move |field| self.field(field).map(|c| (field, c)))
    }

    /// Field containing byte `offset`; delimiters belong to the field before
    /// them
    pub fn field_at(&self, offset: usize) -> UrlField {
        self.fields()
            .filter(|(_, c)| c.offset() <= offset)
            .last()
            .map(|(field, _)| field)
            .unwrap_or(UrlField::Url)
    }
}

/// Split a raw URL into components
pub fn tokenize(raw: &str) -> UrlComponents<'_> {
    let mut url = UrlComponents::empty(raw);
    let mut cursor = 0;

    if let Some(end) = scheme_end(raw) {
        url.scheme = Some(Component::with_lowercase(&raw[..end], 0));
        cursor = end + 1;
    }

    if raw[cursor..].starts_with("//") {
        let auth_start = cursor + 2;
        let auth_end = raw[auth_start..]
            .find(|c: char| matches!(c, '/' | '\\' | '?' | '#'))
            .map(|i| auth_start + i)
            .unwrap_or(raw.len());
        url.authority = Some(Component::new(&raw[auth_start..auth_end], auth_start));
        split_authority(&mut url, auth_start, auth_end);
        cursor = auth_end;
    }

    let path_end = raw[cursor..]
        .find(|c: char| c == '?' || c == '#')
        .map(|i| cursor + i)
        .unwrap_or(raw.len());
    if path_end > cursor {
        url.path = Some(Component::new(&raw[cursor..path_end], cursor));
    }
    cursor = path_end;

    if raw[cursor..].starts_with('?') {
        let query_start = cursor + 1;
        let query_end = raw[query_start..]
            .find('#')
            .map(|i| query_start + i)
            .unwrap_or(raw.len());
        url.query = Some(Component::new(&raw[query_start..query_end], query_start));
        cursor = query_end;
    }

    if raw[cursor..].starts_with('#') {
        url.fragment = Some(Component::new(&raw[cursor + 1..], cursor + 1));
    }

    url
}

// scheme = ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ) ":"
fn scheme_end(raw: &str) -> Option<usize> {
    let bytes = raw.as_bytes();
    if !bytes.first()?.is_ascii_alphabetic() {
        return None;
    }
    for (i, b) in bytes.iter().enumerate().skip(1) {
        match b {
            b':' => return Some(i),
            b if b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.') => {}
            _ => return None,
        }
    }
    None
}

fn split_authority<'a>(url: &mut UrlComponents<'a>, start: usize, end: usize) {
    let raw = url.raw;
    let authority = &raw[start..end];

    let host_start = match authority.rfind('@') {
        Some(at) => {
            url.userinfo = Some(Component::new(&authority[..at], start));
            start + at + 1
        }
        None => start,
    };
    let hostport = &raw[host_start..end];

    let (host_len, port_start) = if hostport.starts_with('[') {
        match hostport.find(']') {
            Some(close) if hostport[close + 1..].starts_with(':') => (close + 1, Some(close + 2)),
            // Unterminated literal or trailing junk stays in the host
            _ => (hostport.len(), None),
        }
    } else {
        match hostport.rfind(':') {
            Some(colon) => (colon, Some(colon + 1)),
            None => (hostport.len(), None),
        }
    };

    if host_len > 0 {
        url.host = Some(Component::with_lowercase(
            &hostport[..host_len],
            host_start,
        ));
    }
    if let Some(port_start) = port_start {
        url.port = Some(Component::new(&hostport[port_start..], host_start + port_start));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_url() {
        let url = tokenize("https://user:pw@Example.COM:8443/a/b?x=1&y=2#frag");
        assert_eq!(url.scheme().unwrap().raw(), "https");
        assert_eq!(url.authority().unwrap().raw(), "user:pw@Example.COM:8443");
        assert_eq!(url.userinfo().unwrap().raw(), "user:pw");
        assert_eq!(url.host().unwrap().raw(), "Example.COM");
        assert_eq!(url.host().unwrap().normalized(), "example.com");
        assert_eq!(url.port().unwrap().raw(), "8443");
        assert_eq!(url.path().unwrap().raw(), "/a/b");
        assert_eq!(url.query().unwrap().raw(), "x=1&y=2");
        assert_eq!(url.fragment().unwrap().raw(), "frag");
    }

    #[test]
    fn test_offsets_point_into_raw() {
        let raw = "http://host:81/p?q#f";
        let url = tokenize(raw);
        for (_, component) in url.fields() {
            assert_eq!(&raw[component.offset()..component.end()], component.raw());
        }
    }

    #[test]
    fn test_scheme_case_preserved() {
        let url = tokenize("HTTPS://example.com");
        assert_eq!(url.scheme().unwrap().raw(), "HTTPS");
        assert_eq!(url.scheme().unwrap().normalized(), "https");
    }

    #[test]
    fn test_missing_scheme() {
        let url = tokenize("example.com/path");
        assert!(url.scheme().is_none());
        assert!(url.host().is_none());
        assert_eq!(url.path().unwrap().raw(), "example.com/path");
    }

    #[test]
    fn test_opaque_url() {
        let url = tokenize("javascript:alert(1)");
        assert_eq!(url.scheme().unwrap().normalized(), "javascript");
        assert!(url.authority().is_none());
        assert!(url.host().is_none());
        assert_eq!(url.path().unwrap().raw(), "alert(1)");
    }

    #[test]
    fn test_empty_input() {
        let url = tokenize("");
        assert!(url.fields().next().is_none());
        assert_eq!(url.field_at(0), UrlField::Url);
    }

    #[test]
    fn test_empty_host_is_absent() {
        let url = tokenize("file:///etc/passwd");
        assert!(url.authority().unwrap().is_empty());
        assert!(url.host().is_none());
        assert_eq!(url.path().unwrap().raw(), "/etc/passwd");
    }

    #[test]
    fn test_empty_query_and_fragment_are_present() {
        let url = tokenize("http://a.com?#");
        assert!(url.path().is_none());
        assert!(url.query().unwrap().is_empty());
        assert!(url.fragment().unwrap().is_empty());
    }

    #[test]
    fn test_last_at_sign_splits_userinfo() {
        let url = tokenize("http://paypal.com@login@evil.example/");
        assert_eq!(url.userinfo().unwrap().raw(), "paypal.com@login");
        assert_eq!(url.host().unwrap().raw(), "evil.example");
    }

    #[test]
    fn test_ipv6_literal() {
        let url = tokenize("http://[::1]:8080/x");
        assert_eq!(url.host().unwrap().raw(), "[::1]");
        assert_eq!(url.port().unwrap().raw(), "8080");

        let url = tokenize("http://[fe80::1]/");
        assert_eq!(url.host().unwrap().raw(), "[fe80::1]");
        assert!(url.port().is_none());
    }

    #[test]
    fn test_empty_port_is_present() {
        let url = tokenize("http://host:/");
        assert_eq!(url.host().unwrap().raw(), "host");
        assert!(url.port().unwrap().is_empty());
    }

    #[test]
    fn test_backslash_ends_authority() {
        let url = tokenize("http://evil.com\\@good.com/");
        assert_eq!(url.host().unwrap().raw(), "evil.com");
        assert!(url.userinfo().is_none());
        assert_eq!(url.path().unwrap().raw(), "\\@good.com/");
    }

    #[test]
    fn test_decoded_forms_retained() {
        let url = tokenize("http://ex%61mple.com/%2e%2e/");
        let host = url.host().unwrap();
        assert_eq!(host.raw(), "ex%61mple.com");
        assert_eq!(host.decoded(), "example.com");
        assert!(host.is_encoded());
        assert_eq!(url.path().unwrap().decoded(), "/../");
    }

    #[test]
    fn test_field_at() {
        let raw = "https://u@h.com:1/p?q#f";
        let url = tokenize(raw);
        assert_eq!(url.field_at(0), UrlField::Scheme);
        assert_eq!(url.field_at(raw.find('u').unwrap()), UrlField::UserInfo);
        assert_eq!(url.field_at(raw.find("h.com").unwrap()), UrlField::Host);
        assert_eq!(url.field_at(raw.find("/p").unwrap() + 1), UrlField::Path);
        assert_eq!(url.field_at(raw.len() - 1), UrlField::Fragment);
    }

    #[test]
    fn test_tokenize_is_idempotent() {
        for raw in [
            "https://example.com/a?b=1",
            "http://user:pass@ex%61mple.com/\x01",
            "javascript:alert(1)",
            "::::",
            "",
        ] {
            assert_eq!(tokenize(raw), tokenize(raw));
        }
    }
}
