//! `X-Twilio-Signature` validation for inbound webhooks.
//!
//! Twilio signs each request with HMAC-SHA1 over the full webhook URL
//! followed by every POST parameter, sorted by name, as `name` + `value`.
//! The key is the account auth token; the digest is base64 encoded.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use kabuto_core::WhatsAppConfig;

type HmacSha1 = Hmac<Sha1>;

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Checks inbound webhook signatures against the account auth token.
#[derive(Clone)]
pub struct SignatureValidator {
    auth_token: String,
    webhook_url: Option<String>,
}

impl SignatureValidator {
    /// Creates a validator for `auth_token`.
    pub fn new(auth_token: impl Into<String>) -> Self {
        Self {
            auth_token: auth_token.into(),
            webhook_url: None,
        }
    }

    /// Fixes the URL signatures are computed over.
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    /// Returns `None` when validation is switched off.
    pub fn from_config(config: &WhatsAppConfig) -> Option<Self> {
        if !config.validate_signature {
            return None;
        }
        let validator = Self::new(config.auth_token.clone());
        Some(match &config.webhook_url {
            Some(url) => validator.with_webhook_url(url.as_str()),
            None => validator,
        })
    }

    /// The configured webhook URL, if any.
    pub fn webhook_url(&self) -> Option<&str> {
        self.webhook_url.as_deref()
    }

    /// Returns true if `signature` matches `url` and `params`.
    pub fn verify(&self, url: &str, params: &[(String, String)], signature: &str) -> bool {
        let Ok(expected) = STANDARD.decode(signature.trim()) else {
            return false;
        };
        match mac(&self.auth_token, url, params) {
            Some(mac) => mac.verify_slice(&expected).is_ok(),
            None => false,
        }
    }
}

/// Computes the base64 signature Twilio would send for `url` and `params`.
pub fn compute_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
) -> Option<String> {
    let mac = mac(auth_token, url, params)?;
    Some(STANDARD.encode(mac.finalize().into_bytes()))
}

fn mac(auth_token: &str, url: &str, params: &[(String, String)]) -> Option<HmacSha1> {
    let mut mac = HmacSha1::new_from_slice(auth_token.as_bytes()).ok()?;
    mac.update(url.as_bytes());

    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();
    for (name, value) in sorted {
        mac.update(name.as_bytes());
        mac.update(value.as_bytes());
    }
    Some(mac)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn voice_request() -> Vec<(String, String)> {
        params(&[
            ("CallSid", "CA1234567890ABCDE"),
            ("Caller", "+12349013030"),
            ("Digits", "1234"),
            ("From", "+12349013030"),
            ("To", "+18005551212"),
        ])
    }

    const DOC_URL: &str = "https://mycompany.com/myapp.php?foo=1&bar=2";

    #[test]
    fn test_known_signature() {
        assert_eq!(
            compute_signature("12345", DOC_URL, &voice_request()).unwrap(),
            "RSOYDt4T1cUTdK1PDd93/VVr8B8="
        );
        assert!(SignatureValidator::new("12345").verify(
            DOC_URL,
            &voice_request(),
            "RSOYDt4T1cUTdK1PDd93/VVr8B8="
        ));
    }

    #[test]
    fn test_parameter_order_does_not_matter() {
        let mut shuffled = voice_request();
        shuffled.reverse();
        assert_eq!(
            compute_signature("12345", DOC_URL, &shuffled),
            compute_signature("12345", DOC_URL, &voice_request())
        );
    }

    #[test]
    fn test_rejects_tampering() {
        let validator = SignatureValidator::new("12345");
        let signature = compute_signature("12345", DOC_URL, &voice_request()).unwrap();

        let mut tampered = voice_request();
        tampered[3].1 = "+19999999999".into();
        assert!(!validator.verify(DOC_URL, &tampered, &signature));
        assert!(!validator.verify("https://mycompany.com/other", &voice_request(), &signature));
        assert!(!SignatureValidator::new("54321").verify(DOC_URL, &voice_request(), &signature));
        assert!(!validator.verify(DOC_URL, &voice_request(), ""));
        assert!(!validator.verify(DOC_URL, &voice_request(), "not base64!"));
    }

    #[test]
    fn test_from_config() {
        let mut config = WhatsAppConfig {
            account_sid: "AC123".into(),
            auth_token: "secret".into(),
            from_number: "+14155238886".into(),
            api_base: "https://api.twilio.com".into(),
            webhook_url: None,
            validate_signature: true,
        };
        let validator = SignatureValidator::from_config(&config).unwrap();
        assert_eq!(validator.webhook_url(), None);

        config.validate_signature = false;
        assert!(SignatureValidator::from_config(&config).is_none());
    }
}
