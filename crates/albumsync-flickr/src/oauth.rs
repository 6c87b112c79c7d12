//! OAuth 1.0a request signing (HMAC-SHA1)

use crate::error::{FlickrError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Consumer key pair plus a pre-issued access token
#[derive(Clone)]
pub struct OAuthCredentials {
    consumer_key: String,
    consumer_secret: String,
    token: String,
    token_secret: String,
}

impl std::fmt::Debug for OAuthCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthCredentials")
            .field("consumer_key", &self.consumer_key)
            .field("token", &self.token)
            .finish_non_exhaustive()
    }
}

impl OAuthCredentials {
    /// Create credentials
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }

    /// Add the `oauth_*` parameters and the signature to `params`
    pub fn authorize(
        &self,
        method: &str,
        url: &str,
        params: &mut Vec<(String, String)>,
    ) -> Result<()> {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorize_with(method, url, params, &nonce, &timestamp)
    }

    /// Add the `oauth_*` parameters and the signature using a fixed nonce and timestamp
    pub fn authorize_with(
        &self,
        method: &str,
        url: &str,
        params: &mut Vec<(String, String)>,
        nonce: &str,
        timestamp: &str,
    ) -> Result<()> {
        params.extend([
            ("oauth_consumer_key".to_string(), self.consumer_key.clone()),
            ("oauth_nonce".to_string(), nonce.to_string()),
            ("oauth_signature_method".to_string(), "HMAC-SHA1".to_string()),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            ("oauth_token".to_string(), self.token.clone()),
            ("oauth_version".to_string(), "1.0".to_string()),
        ]);
        let signature = sign(
            method,
            url,
            params,
            &self.consumer_secret,
            &self.token_secret,
        )?;
        params.push(("oauth_signature".to_string(), signature));
        Ok(())
    }
}

/// RFC 3986 percent-encoding, leaving only unreserved characters as is
pub fn percent_encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

/// Signature base string: method, URL and the sorted, encoded parameters
pub fn signature_base_string(method: &str, url: &str, params: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.sort();

    let normalized = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(url),
        percent_encode(&normalized)
    )
}

/// HMAC-SHA1 signature of a request, base64 encoded
pub fn sign(
    method: &str,
    url: &str,
    params: &[(String, String)],
    consumer_secret: &str,
    token_secret: &str,
) -> Result<String> {
    let key = format!(
        "{}&{}",
        percent_encode(consumer_secret),
        percent_encode(token_secret)
    );
    let base = signature_base_string(method, url, params);

    let mut mac = HmacSha1::new_from_slice(key.as_bytes())
        .map_err(|e| FlickrError::Credentials(format!("Invalid signing key: {}", e)))?;
    mac.update(base.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_params() -> Vec<(String, String)> {
        vec![
            ("file".to_string(), "vacation.jpg".to_string()),
            ("size".to_string(), "original".to_string()),
        ]
    }

    #[test]
    fn test_reference_signature() {
        let credentials = OAuthCredentials::new(
            "dpf43f3p2l4k3l03",
            "kd94hf93k423kf44",
            "nnch734d00sl2jdk",
            "pfkkdhi9sl3r4s00",
        );
        let mut params = reference_params();
        credentials.authorize_with(
            "GET",
            "http://photos.example.net/photos",
            &mut params,
            "kllo9940pd9333jh",
            "1191242096",
        )
        .unwrap();

        let signature = params
            .iter()
            .find(|(k, _)| k == "oauth_signature")
            .map(|(_, v)| v.as_str());
        assert_eq!(signature, Some("tR3+Ty81lMeYAr/Fid0kMTYa/WM="));
    }

    #[test]
    fn test_base_string_sorts_and_encodes() {
        let params = vec![
            ("b".to_string(), "two words".to_string()),
            ("a".to_string(), "x=y".to_string()),
        ];
        assert_eq!(
            signature_base_string("post", "https://up.flickr.com/services/upload/", &params),
            "POST&https%3A%2F%2Fup.flickr.com%2Fservices%2Fupload%2F&a%3Dx%253Dy%26b%3Dtwo%2520words"
        );
    }

    #[test]
    fn test_percent_encode_unreserved() {
        assert_eq!(percent_encode("a-b_c.d~e"), "a-b_c.d~e");
        assert_eq!(percent_encode("checksum:md5=ab"), "checksum%3Amd5%3Dab");
    }

    #[test]
    fn test_debug_hides_secrets() {
        let credentials = OAuthCredentials::new("key", "secret1", "token", "secret2");
        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("secret1"));
        assert!(!debug.contains("secret2"));
    }
}
