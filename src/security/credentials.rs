//! Client identity for the node: access token plus transport trust.

use thiserror::Error;

use crate::net::tls::{build_transport_credentials, TransportCredentials};
use crate::security::macaroon::{Macaroon, MacaroonError};

/// Errors raised while building credentials. Both abort before any I/O.
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("malformed access token: {0}")]
    MalformedToken(#[from] MacaroonError),

    #[error("invalid TLS certificate: {0}")]
    InvalidCertificate(String),

    #[error("access token is not valid call metadata: {0}")]
    TokenMetadata(String),
}

/// Decode the raw access token bytes.
pub fn build_access_token(raw: &[u8]) -> Result<Macaroon, CredentialError> {
    Ok(Macaroon::from_binary(raw)?)
}

/// Immutable credential bundle owned by the node connector.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub transport: TransportCredentials,
    pub token: Macaroon,
}

impl Credentials {
    /// Build the bundle. The token is checked first.
    pub fn build(token: &[u8], cert_pem: Option<&[u8]>) -> Result<Self, CredentialError> {
        let token = build_access_token(token)?;
        let transport = build_transport_credentials(cert_pem)?;
        Ok(Self { transport, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::macaroon::SIGNATURE_LEN;

    fn token_bytes() -> Vec<u8> {
        Macaroon::from_parts(None, b"id".to_vec(), Vec::new(), [0; SIGNATURE_LEN]).to_binary()
    }

    #[test]
    fn test_malformed_token() {
        let err = build_access_token(b"\xffnope").unwrap_err();
        assert!(matches!(err, CredentialError::MalformedToken(_)));
        assert!(err.to_string().starts_with("malformed access token"));
    }

    #[test]
    fn test_bundle_with_default_trust() {
        let creds = Credentials::build(&token_bytes(), None).unwrap();
        assert_eq!(creds.transport, TransportCredentials::SystemTrust);
        assert_eq!(creds.token.identifier(), b"id");
    }

    #[test]
    fn test_token_checked_before_certificate() {
        let err = Credentials::build(b"", Some(b"garbage")).unwrap_err();
        assert!(matches!(err, CredentialError::MalformedToken(_)));

        let err = Credentials::build(&token_bytes(), Some(b"garbage")).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCertificate(_)));
    }
}
