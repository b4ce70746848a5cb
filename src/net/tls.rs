//! TLS trust configuration for the node connection.
//!
//! System trust goes through tonic's own TLS stack. A pinned bundle gets a
//! rustls connector of its own: node certificates are self-signed with
//! `CA:TRUE`, which webpki refuses as an end-entity. A presented certificate
//! byte-equal to a pinned one is accepted as is; any other must chain to a
//! pinned certificate. Handshake signatures are always checked.

use std::io;
use std::sync::Arc;

use hyper_util::rt::TokioIo;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{
    verify_tls12_signature, verify_tls13_signature, CryptoProvider, WebPkiSupportedAlgorithms,
};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;
use tonic::codegen::http::Uri;
use tonic::transport::ClientTlsConfig;

use crate::security::credentials::CredentialError;

/// Install ring as the process-wide rustls provider. Idempotent.
pub fn install_crypto_provider() {
    let _ = rustls::crypto::ring::default_provider().install_default();
}

/// How the server certificate of the node is verified.
#[derive(Clone, PartialEq, Eq)]
pub enum TransportCredentials {
    /// Use the host's system trust store.
    SystemTrust,
    /// Trust exactly the given certificates (DER).
    Pinned(Vec<CertificateDer<'static>>),
}

impl TransportCredentials {
    /// Number of pinned certificates (zero for system trust).
    pub fn pinned_count(&self) -> usize {
        match self {
            TransportCredentials::SystemTrust => 0,
            TransportCredentials::Pinned(certs) => certs.len(),
        }
    }
}

impl std::fmt::Debug for TransportCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportCredentials::SystemTrust => write!(f, "SystemTrust"),
            TransportCredentials::Pinned(certs) => write!(f, "Pinned({} certs)", certs.len()),
        }
    }
}

/// tonic TLS settings for the system trust store.
pub fn system_tls_config() -> ClientTlsConfig {
    ClientTlsConfig::new().with_native_roots()
}

/// Build transport credentials from an optional PEM bundle.
///
/// `None` selects the system trust store. Otherwise every `CERTIFICATE` block
/// that parses as an X.509 certificate is kept; a bundle yielding none is
/// rejected.
pub fn build_transport_credentials(
    raw_pem: Option<&[u8]>,
) -> Result<TransportCredentials, CredentialError> {
    let Some(raw_pem) = raw_pem else {
        return Ok(TransportCredentials::SystemTrust);
    };

    let mut reader = raw_pem;
    let mut store = RootCertStore::empty();
    let mut trusted = Vec::new();
    let mut rejected = 0usize;

    for item in rustls_pemfile::certs(&mut reader) {
        let Ok(der) = item else {
            rejected += 1;
            continue;
        };
        match store.add(der.clone()) {
            Ok(()) => trusted.push(der),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unparsable certificate");
                rejected += 1;
            }
        }
    }

    if trusted.is_empty() {
        return Err(CredentialError::InvalidCertificate(format!(
            "no valid certificates in PEM bundle ({} rejected)",
            rejected
        )));
    }

    Ok(TransportCredentials::Pinned(trusted))
}

/// Accepts a pinned certificate presented directly, or a chain to one.
#[derive(Debug)]
struct PinnedCertVerifier {
    pinned: Vec<CertificateDer<'static>>,
    chained: Arc<WebPkiServerVerifier>,
    algorithms: WebPkiSupportedAlgorithms,
}

impl PinnedCertVerifier {
    fn new(
        certs: &[CertificateDer<'static>],
        provider: &Arc<CryptoProvider>,
    ) -> Result<Self, CredentialError> {
        let mut roots = RootCertStore::empty();
        roots.add_parsable_certificates(certs.iter().cloned());
        let chained = WebPkiServerVerifier::builder_with_provider(Arc::new(roots), provider.clone())
            .build()
            .map_err(|e| CredentialError::InvalidCertificate(e.to_string()))?;

        Ok(Self {
            pinned: certs.to_vec(),
            chained,
            algorithms: provider.signature_verification_algorithms,
        })
    }
}

impl ServerCertVerifier for PinnedCertVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        if self
            .pinned
            .iter()
            .any(|cert| cert.as_ref() == end_entity.as_ref())
        {
            return Ok(ServerCertVerified::assertion());
        }
        self.chained
            .verify_server_cert(end_entity, intermediates, server_name, ocsp_response, now)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.algorithms.supported_schemes()
    }
}

/// Build a TLS connector that trusts only `certs`, negotiating HTTP/2.
pub fn pinned_connector(certs: &[CertificateDer<'static>]) -> Result<TlsConnector, CredentialError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let verifier = PinnedCertVerifier::new(certs, &provider)?;

    let mut config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| CredentialError::InvalidCertificate(e.to_string()))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(verifier))
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec()];

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Open a TCP connection to `uri` and run the TLS handshake over it.
pub async fn dial_tls(
    connector: TlsConnector,
    uri: Uri,
) -> io::Result<TokioIo<TlsStream<TcpStream>>> {
    let host = uri
        .host()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "URI has no host"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    let port = uri.port_u16().unwrap_or(443);

    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let tcp = TcpStream::connect((host, port)).await?;
    let stream = connector.connect(server_name, tcp).await?;
    Ok(TokioIo::new(stream))
}
