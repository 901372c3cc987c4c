//! Request signing for the Log Service API
//!
//! Signature = base64(hmac-sha1(secret, string-to-sign)) where the string to
//! sign is built from the verb, body digest, content type, date, the sorted
//! `x-log-`/`x-acs-` headers and the canonical resource.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use sha1::Sha1;
use std::collections::BTreeMap;

use crate::error::{ClientError, Result};

type HmacSha1 = Hmac<Sha1>;

/// Upper-case hex MD5 of the request body
pub(crate) fn content_md5(body: &[u8]) -> String {
    Md5::digest(body)
        .iter()
        .map(|byte| format!("{:02X}", byte))
        .collect()
}

/// Headers and resource that take part in the signature
pub(crate) struct SignedRequest<'a> {
    pub verb: &'a str,
    pub content_md5: &'a str,
    pub content_type: &'a str,
    pub date: &'a str,
    /// Lower-case header names; sorted by the map
    pub headers: &'a BTreeMap<String, String>,
    pub resource: &'a str,
}

impl SignedRequest<'_> {
    fn string_to_sign(&self) -> String {
        let canonical_headers = self
            .headers
            .iter()
            .filter(|(name, _)| name.starts_with("x-log-") || name.starts_with("x-acs-"))
            .map(|(name, value)| format!("{}:{}", name, value))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            self.verb,
            self.content_md5,
            self.content_type,
            self.date,
            canonical_headers,
            self.resource
        )
    }

    /// Computes the base64 signature with the access key secret
    pub(crate) fn sign(&self, secret: &str) -> Result<String> {
        let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
            .map_err(|e| ClientError::SigningFailed(e.to_string()))?;
        mac.update(self.string_to_sign().as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}
