use crate::constants::{
    AWS_QUERY_ENCODE_SET, X_AMZ_CONTENT_SHA_256, X_AMZ_DATE, X_AMZ_SECURITY_TOKEN,
};
use crate::Credential;
use async_trait::async_trait;
use awsrpc_core::hash::{hex_hmac_sha256, hex_sha256, hmac_sha256};
use awsrpc_core::time::{
    format_date, format_iso8601, now, parse_http_date, parse_iso8601, DateTime,
};
use awsrpc_core::utils::clean_path_keep_trailing_slash;
use awsrpc_core::{Body, Context, Error, Result, SignRequest};
use http::header::{AUTHORIZATION, DATE, HOST};
use http::{HeaderMap, HeaderValue, Method};
use log::debug;
use percent_encoding::{percent_decode_str, utf8_percent_encode};
use std::collections::BTreeMap;
use std::fmt::Write;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// RequestSigner that implement AWS SigV4.
///
/// - [Signature Version 4 signing process](https://docs.aws.amazon.com/general/latest/gr/signature-version-4.html)
///
/// Signing mutates the request in place: it sets `host`,
/// `x-amz-content-sha256`, `x-amz-date` (when no usable date header exists),
/// `Authorization` and, for temporary credentials, `X-Amz-Security-Token`.
/// Every header present when signing starts is signed.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    service: String,
    region: String,

    time: Option<DateTime>,
}

impl RequestSigner {
    /// Create a new builder for AWS V4 signer.
    pub fn new(service: &str, region: &str) -> Self {
        Self {
            service: service.into(),
            region: region.into(),

            time: None,
        }
    }

    /// Specify the signing time.
    ///
    /// # Note
    ///
    /// We should always take current time to sign requests.
    /// Only use this function for testing.
    #[cfg(test)]
    pub fn with_time(mut self, time: DateTime) -> Self {
        self.time = Some(time);
        self
    }
}

#[async_trait]
impl SignRequest for RequestSigner {
    type Credential = Credential;

    async fn sign_request(
        &self,
        _: &Context,
        req: &mut http::Request<Body>,
        cred: &Self::Credential,
    ) -> Result<()> {
        // Leftovers of an earlier signing must not become signed headers.
        req.headers_mut().remove(AUTHORIZATION);
        req.headers_mut().remove(X_AMZ_SECURITY_TOKEN);

        if !req.headers().contains_key(HOST) {
            let authority = req
                .uri()
                .authority()
                .ok_or_else(|| Error::request_invalid("request uri has no authority to sign"))?
                .as_str()
                .to_string();
            req.headers_mut()
                .insert(HOST, HeaderValue::from_str(&authority)?);
        }

        let payload = req.body_mut().buffer().map_err(|e| {
            Error::request_invalid("failed to read request body for signing").with_source(e)
        })?;
        let payload_hash = hex_sha256(&payload);
        req.headers_mut()
            .insert(X_AMZ_CONTENT_SHA_256, HeaderValue::from_str(&payload_hash)?);

        let time = request_time(req.headers_mut(), self.time.unwrap_or_else(now))?;

        let creq = canonical_request(
            req.method(),
            req.uri().path(),
            req.uri().query(),
            req.headers(),
            &payload_hash,
        )?;
        debug!("calculated canonical request: {creq}");

        // Scope: "20220313/<region>/<service>/aws4_request"
        let scope = credential_scope(time, &self.region, &self.service);
        debug!("calculated scope: {scope}");

        let string_to_sign = string_to_sign(time, &scope, &creq);
        debug!("calculated string to sign: {string_to_sign}");

        let signing_key =
            generate_signing_key(&cred.secret_access_key, time, &self.region, &self.service);
        let signature = hex_hmac_sha256(&signing_key, string_to_sign.as_bytes());

        let (_, signed_headers) = canonical_headers(req.headers())?;
        let mut authorization = HeaderValue::from_str(&format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            cred.access_key_id,
        ))?;
        authorization.set_sensitive(true);
        req.headers_mut().insert(AUTHORIZATION, authorization);

        if let Some(token) = cred.session_token.as_deref().filter(|v| !v.is_empty()) {
            let mut value = HeaderValue::from_str(token)?;
            // Set token value sensitive to valid leaking.
            value.set_sensitive(true);
            req.headers_mut().insert(X_AMZ_SECURITY_TOKEN, value);
        }

        Ok(())
    }
}

/// Determine the signing time from the request headers.
///
/// `x-amz-date` in basic format wins; `x-amz-date` in HTTP date format is
/// used and rewritten to basic format; then the `date` header in HTTP date
/// format; otherwise `fallback` is used and written to `x-amz-date`.
pub(crate) fn request_time(headers: &mut HeaderMap, fallback: DateTime) -> Result<DateTime> {
    if let Some(value) = headers.get(X_AMZ_DATE).and_then(|v| v.to_str().ok()) {
        if let Ok(t) = parse_iso8601(value) {
            return Ok(t);
        }
        if let Ok(t) = parse_http_date(value) {
            headers.insert(X_AMZ_DATE, HeaderValue::from_str(&format_iso8601(t))?);
            return Ok(t);
        }
    }

    if let Some(value) = headers.get(DATE).and_then(|v| v.to_str().ok()) {
        if let Ok(t) = parse_http_date(value) {
            return Ok(t);
        }
    }

    headers.insert(X_AMZ_DATE, HeaderValue::from_str(&format_iso8601(fallback))?);
    Ok(fallback)
}

/// Canonical URI: the cleaned path with every segment re-encoded.
///
/// SigV4 encodes every byte outside the RFC 3986 unreserved set
/// (`A-Z a-z 0-9 - . _ ~`), so sub-delimiters such as `:$&+,;=@` become
/// `%XX`. Path labels are sent with the same set, which keeps this form equal
/// to the path on the wire.
pub(crate) fn canonical_uri(path: &str) -> Result<String> {
    let cleaned = clean_path_keep_trailing_slash(path);

    let mut uri = String::with_capacity(cleaned.len());
    for (idx, segment) in cleaned.split('/').enumerate() {
        if idx > 0 {
            uri.push('/');
        }
        let decoded = percent_decode_str(segment).decode_utf8().map_err(|e| {
            Error::request_invalid("request path is not valid utf-8")
                .with_context(format!("path: {path}"))
                .with_source(e)
        })?;
        uri.extend(utf8_percent_encode(&decoded, &AWS_QUERY_ENCODE_SET));
    }
    Ok(uri)
}

/// Canonical query string: `key=value` pairs, encoded and sorted.
pub(crate) fn canonical_query_string(query: Option<&str>) -> String {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return String::new();
    };

    let mut pairs: Vec<String> = form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| {
            format!(
                "{}={}",
                utf8_percent_encode(&k, &AWS_QUERY_ENCODE_SET),
                utf8_percent_encode(&v, &AWS_QUERY_ENCODE_SET)
            )
        })
        .collect();
    pairs.sort();
    pairs.join("&")
}

/// Canonical headers and signed headers.
///
/// Names are lower-cased (the `http` crate already stores them so), values
/// trimmed, sorted and comma joined. The result does not depend on header
/// insertion order.
pub(crate) fn canonical_headers(headers: &HeaderMap) -> Result<(String, String)> {
    let mut grouped: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for (name, value) in headers.iter() {
        let value = value.to_str().map_err(|e| {
            Error::request_invalid("header value is not visible ascii")
                .with_context(format!("header: {name}"))
                .with_source(e)
        })?;
        grouped
            .entry(name.as_str().to_lowercase())
            .or_default()
            .push(value.trim_matches(' '));
    }

    let mut lines = Vec::with_capacity(grouped.len());
    for (name, values) in grouped.iter_mut() {
        values.sort_unstable();
        lines.push(format!("{name}:{}", values.join(",")));
    }
    lines.sort();

    let signed = grouped.keys().cloned().collect::<Vec<_>>().join(";");
    Ok((lines.join("\n"), signed))
}

/// Build the canonical request.
///
/// ```text
/// METHOD
/// CANONICAL_URI
/// CANONICAL_QUERYSTRING
/// CANONICAL_HEADERS
///
/// SIGNED_HEADERS
/// PAYLOAD_HASH
/// ```
pub(crate) fn canonical_request(
    method: &Method,
    path: &str,
    query: Option<&str>,
    headers: &HeaderMap,
    payload_hash: &str,
) -> Result<String> {
    let (canonical_headers, signed_headers) = canonical_headers(headers)?;

    // 256 is specially chosen to avoid reallocation for most requests.
    let mut f = String::with_capacity(256);
    writeln!(f, "{method}")?;
    writeln!(f, "{}", canonical_uri(path)?)?;
    writeln!(f, "{}", canonical_query_string(query))?;
    writeln!(f, "{canonical_headers}")?;
    writeln!(f)?;
    writeln!(f, "{signed_headers}")?;
    write!(f, "{payload_hash}")?;
    Ok(f)
}

pub(crate) fn credential_scope(time: DateTime, region: &str, service: &str) -> String {
    format!("{}/{region}/{service}/aws4_request", format_date(time))
}

/// StringToSign:
///
/// ```text
/// AWS4-HMAC-SHA256
/// 20220313T072004Z
/// 20220313/<region>/<service>/aws4_request
/// <hashed_canonical_request>
/// ```
pub(crate) fn string_to_sign(time: DateTime, scope: &str, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{}\n{scope}\n{}",
        format_iso8601(time),
        hex_sha256(canonical_request.as_bytes())
    )
}

pub(crate) fn generate_signing_key(
    secret: &str,
    time: DateTime,
    region: &str,
    service: &str,
) -> Vec<u8> {
    // Sign secret
    let secret = format!("AWS4{secret}");
    // Sign date
    let sign_date = hmac_sha256(secret.as_bytes(), format_date(time).as_bytes());
    // Sign region
    let sign_region = hmac_sha256(sign_date.as_slice(), region.as_bytes());
    // Sign service
    let sign_service = hmac_sha256(sign_region.as_slice(), service.as_bytes());
    // Sign request
    hmac_sha256(sign_service.as_slice(), "aws4_request".as_bytes())
}
