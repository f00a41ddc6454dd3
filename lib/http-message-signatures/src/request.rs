//!
//! Borrowed view of the request that is being signed or verified
//!

use http::{request::Parts, uri::Scheme, HeaderMap, Method, Request, Uri};

/// Whether a body is implied for the method even if it's empty
#[inline]
fn carries_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Request description consumed by the signer and the verifier
#[derive(Clone, Copy, Debug)]
pub struct RequestDescriptor<'a> {
    method: &'a Method,
    uri: &'a Uri,
    headers: &'a HeaderMap,
    body: Option<&'a [u8]>,
}

impl<'a> RequestDescriptor<'a> {
    /// Construct a descriptor from its raw parts
    ///
    /// `None` as the body means the request is bodyless, `Some(&[])` means it carries an empty body
    #[must_use]
    pub fn new(
        method: &'a Method,
        uri: &'a Uri,
        headers: &'a HeaderMap,
        body: Option<&'a [u8]>,
    ) -> Self {
        Self {
            method,
            uri,
            headers,
            body,
        }
    }

    /// Construct a descriptor from the parts of an HTTP request
    #[must_use]
    pub fn from_parts(parts: &'a Parts, body: Option<&'a [u8]>) -> Self {
        Self::new(&parts.method, &parts.uri, &parts.headers, body)
    }

    /// Construct a descriptor from an HTTP request
    ///
    /// An empty body counts as absent unless the method is POST, PUT or PATCH
    #[must_use]
    pub fn from_request<B>(req: &'a Request<B>) -> Self
    where
        B: AsRef<[u8]>,
    {
        let body = req.body().as_ref();
        let body = (!body.is_empty() || carries_body(req.method())).then_some(body);

        Self::new(req.method(), req.uri(), req.headers(), body)
    }

    /// HTTP method
    #[must_use]
    pub fn method(&self) -> &'a Method {
        self.method
    }

    /// Request URI
    #[must_use]
    pub fn uri(&self) -> &'a Uri {
        self.uri
    }

    /// Header snapshot
    #[must_use]
    pub fn headers(&self) -> &'a HeaderMap {
        self.headers
    }

    /// Raw body bytes, if the request carries a body
    #[must_use]
    pub fn body(&self) -> Option<&'a [u8]> {
        self.body
    }

    /// Authority as it appears on the wire
    ///
    /// Taken from the URI if it's absolute, otherwise from the `Host` header.
    /// Ports are only included if they aren't the default port of the scheme.
    #[must_use]
    pub fn authority(&self) -> Option<String> {
        if let Some(host) = self.uri.host() {
            let authority = match self.uri.port_u16() {
                Some(port) if !is_default_port(self.uri.scheme(), port) => {
                    format!("{}:{port}", host.to_ascii_lowercase())
                }
                _ => host.to_ascii_lowercase(),
            };

            return Some(authority);
        }

        self.headers
            .get(http::header::HOST)
            .and_then(|value| value.to_str().ok())
            .map(str::to_ascii_lowercase)
    }
}

#[inline]
fn is_default_port(scheme: Option<&Scheme>, port: u16) -> bool {
    match scheme {
        Some(scheme) if *scheme == Scheme::HTTPS => port == 443,
        Some(scheme) if *scheme == Scheme::HTTP => port == 80,
        _ => false,
    }
}

#[cfg(test)]
mod test {
    use super::RequestDescriptor;
    use http::{HeaderMap, HeaderValue, Method, Request, Uri};

    fn authority_of(uri: &'static str, host: Option<&'static str>) -> Option<String> {
        let uri = Uri::from_static(uri);
        let mut headers = HeaderMap::new();
        if let Some(host) = host {
            headers.insert(http::header::HOST, HeaderValue::from_static(host));
        }

        RequestDescriptor::new(&Method::GET, &uri, &headers, None).authority()
    }

    #[test]
    fn strips_default_ports() {
        assert_eq!(
            authority_of("https://api.ebay.com:443/test", None).as_deref(),
            Some("api.ebay.com")
        );
        assert_eq!(
            authority_of("http://api.ebay.com:80/test", None).as_deref(),
            Some("api.ebay.com")
        );
    }

    #[test]
    fn keeps_non_default_ports() {
        assert_eq!(
            authority_of("https://api.ebay.com:8443/test", None).as_deref(),
            Some("api.ebay.com:8443")
        );
    }

    #[test]
    fn falls_back_to_host_header() {
        assert_eq!(
            authority_of("/test", Some("Example.com:8080")).as_deref(),
            Some("example.com:8080")
        );
        assert_eq!(authority_of("/test", None), None);
    }

    #[test]
    fn empty_body_handling() {
        let get = Request::get("/").body(Vec::new()).unwrap();
        assert!(RequestDescriptor::from_request(&get).body().is_none());

        let post = Request::post("/").body(Vec::new()).unwrap();
        assert_eq!(RequestDescriptor::from_request(&post).body(), Some(&[][..]));
    }
}
