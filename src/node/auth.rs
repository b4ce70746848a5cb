//! Per-call macaroon attachment.

use tonic::metadata::errors::InvalidMetadataValue;
use tonic::metadata::AsciiMetadataValue;
use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::security::macaroon::Macaroon;

/// Metadata key the node reads the access token from.
pub const MACAROON_METADATA_KEY: &str = "macaroon";

/// Interceptor that adds the hex-encoded macaroon to every outgoing call.
#[derive(Clone)]
pub struct MacaroonInterceptor {
    value: AsciiMetadataValue,
}

impl MacaroonInterceptor {
    pub fn new(token: &Macaroon) -> Result<Self, InvalidMetadataValue> {
        Ok(Self {
            value: token.to_hex().parse()?,
        })
    }
}

impl Interceptor for MacaroonInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert(MACAROON_METADATA_KEY, self.value.clone());
        Ok(request)
    }
}

impl std::fmt::Debug for MacaroonInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MacaroonInterceptor").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::macaroon::SIGNATURE_LEN;

    #[test]
    fn test_every_call_carries_token() {
        let token = Macaroon::from_parts(None, b"abc".to_vec(), Vec::new(), [3; SIGNATURE_LEN]);
        let mut interceptor = MacaroonInterceptor::new(&token).unwrap();

        for _ in 0..2 {
            let request = interceptor.call(Request::new(())).unwrap();
            let value = request.metadata().get(MACAROON_METADATA_KEY).unwrap();
            assert_eq!(value.to_str().unwrap(), token.to_hex());
        }
    }
}
