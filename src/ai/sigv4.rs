//! AWS Signature Version 4 request signing, enough for Bedrock `InvokeModel`.
//!
//! Only header-based signing is implemented. Paths are treated as already
//! URI-encoded and are encoded once more for the canonical request, which is
//! what every AWS service except S3 expects.

use crate::config::AwsCredentials;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";

pub struct SigningRequest<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub query: &'a str,
    /// Every header to sign, `host` and `x-amz-date` included.
    pub headers: Vec<(String, String)>,
    pub payload: &'a [u8],
}

pub fn amz_date(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%dT%H%M%SZ").to_string()
}

fn date_stamp(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%d").to_string()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn canonical_query(query: &str) -> String {
    let mut pairs: Vec<(String, String)> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| match p.split_once('=') {
            Some((k, v)) => (uri_encode(k, true), uri_encode(v, true)),
            None => (uri_encode(p, true), String::new()),
        })
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Returns the canonical request and the signed-headers list.
pub fn canonical_request(request: &SigningRequest<'_>) -> (String, String) {
    let mut headers: Vec<(String, String)> = request
        .headers
        .iter()
        .map(|(name, value)| {
            let value = value.split_whitespace().collect::<Vec<_>>().join(" ");
            (name.to_ascii_lowercase(), value)
        })
        .collect();
    headers.sort();

    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{}:{}\n", name, value))
        .collect();
    let signed_headers = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");

    let path = if request.path.is_empty() { "/" } else { request.path };
    let canonical = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        request.method.to_ascii_uppercase(),
        uri_encode(path, false),
        canonical_query(request.query),
        canonical_headers,
        signed_headers,
        sha256_hex(request.payload)
    );
    (canonical, signed_headers)
}

pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

/// Computes the `Authorization` header value for the request.
pub fn authorization(
    request: &SigningRequest<'_>,
    credentials: &AwsCredentials,
    region: &str,
    service: &str,
    time: &DateTime<Utc>,
) -> String {
    let date = date_stamp(time);
    let scope = format!("{}/{}/{}/aws4_request", date, region, service);
    let (canonical, signed_headers) = canonical_request(request);

    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date(time),
        scope,
        sha256_hex(canonical.as_bytes())
    );
    let key = signing_key(&credentials.secret_access_key, &date, region, service);
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn example_credentials() -> AwsCredentials {
        AwsCredentials {
            access_key_id: "AKIDEXAMPLE".to_string(),
            secret_access_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".to_string(),
            session_token: None,
        }
    }

    fn example_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap()
    }

    #[test]
    fn test_signing_key_derivation() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20150830",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_get_vanilla_canonical_request() {
        let request = SigningRequest {
            method: "GET",
            path: "/",
            query: "",
            headers: vec![
                ("Host".to_string(), "example.amazon.com".to_string()),
                ("X-Amz-Date".to_string(), "20150830T123600Z".to_string()),
            ],
            payload: b"",
        };
        let (canonical, signed) = canonical_request(&request);
        assert_eq!(signed, "host;x-amz-date");
        assert_eq!(
            canonical,
            "GET\n/\n\nhost:example.amazon.com\nx-amz-date:20150830T123600Z\n\nhost;x-amz-date\n\
             e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_get_vanilla_signature() {
        let request = SigningRequest {
            method: "GET",
            path: "/",
            query: "",
            headers: vec![
                ("Host".to_string(), "example.amazon.com".to_string()),
                ("X-Amz-Date".to_string(), "20150830T123600Z".to_string()),
            ],
            payload: b"",
        };
        let header = authorization(
            &request,
            &example_credentials(),
            "us-east-1",
            "service",
            &example_time(),
        );
        assert_eq!(
            header,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
             SignedHeaders=host;x-amz-date, \
             Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
        );
    }

    #[test]
    fn test_encoded_path_is_encoded_again() {
        let request = SigningRequest {
            method: "post",
            path: "/model/anthropic.claude-v2%3A1/invoke",
            query: "",
            headers: vec![("host".to_string(), "bedrock".to_string())],
            payload: b"{}",
        };
        let (canonical, _) = canonical_request(&request);
        let mut lines = canonical.lines();
        assert_eq!(lines.next(), Some("POST"));
        assert_eq!(lines.next(), Some("/model/anthropic.claude-v2%253A1/invoke"));
    }

    #[test]
    fn test_canonical_query_is_sorted_and_encoded() {
        assert_eq!(canonical_query("b=2&a=x y&c"), "a=x%20y&b=2&c=");
        assert_eq!(canonical_query(""), "");
    }

    #[test]
    fn test_header_values_are_trimmed() {
        let request = SigningRequest {
            method: "GET",
            path: "",
            query: "",
            headers: vec![("My-Header".to_string(), "  a   b  ".to_string())],
            payload: b"",
        };
        let (canonical, signed) = canonical_request(&request);
        assert!(canonical.contains("my-header:a b\n"));
        assert_eq!(signed, "my-header");
    }

    #[test]
    fn test_amz_date_format() {
        assert_eq!(amz_date(&example_time()), "20150830T123600Z");
    }
}
