// src/endpoint.rs

use crate::error::ReliqError;

/// Splits an endpoint of the form `scheme://rest` into its two parts.
/// Both parts must be non-empty.
pub(crate) fn split_endpoint(endpoint: &str) -> Result<(&str, &str), ReliqError> {
  match endpoint.split_once("://") {
    Some((scheme, rest)) if !scheme.is_empty() && !rest.is_empty() => Ok((scheme, rest)),
    _ => Err(ReliqError::InvalidEndpoint(endpoint.to_string())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn splits_valid_endpoint() {
    assert_eq!(split_endpoint("inproc://service").unwrap(), ("inproc", "service"));
    assert_eq!(split_endpoint("tcp://127.0.0.1:5555").unwrap(), ("tcp", "127.0.0.1:5555"));
  }

  #[test]
  fn rejects_malformed_endpoints() {
    for ep in ["", "inproc://", "://name", "no-scheme", "inproc:/name"] {
      assert!(matches!(split_endpoint(ep), Err(ReliqError::InvalidEndpoint(_))), "{ep}");
    }
  }
}
