//! Read back what an issued certificate actually says.

use chrono::{DateTime, Utc};
use std::net::IpAddr;
use x509_parser::extensions::GeneralName;
use x509_parser::pem::parse_x509_pem;
use x509_parser::prelude::*;

use crate::errors::{Error, Result};

/// Fields of an X.509 certificate relevant to rotation decisions and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateInfo {
    pub common_name: Option<String>,
    pub organization: Option<String>,
    pub serial: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub dns_names: Vec<String>,
    pub ip_addresses: Vec<IpAddr>,
    pub is_ca: bool,
    pub server_auth: bool,
    pub client_auth: bool,
}

impl CertificateInfo {
    pub fn from_pem(pem: &str) -> Result<Self> {
        let (_, pem) = parse_x509_pem(pem.as_bytes())
            .map_err(|e| Error::certificate(format!("failed to decode certificate PEM: {}", e)))?;
        let cert = pem
            .parse_x509()
            .map_err(|e| Error::certificate(format!("failed to parse certificate: {}", e)))?;

        let validity = cert.validity();
        let not_before = to_utc(validity.not_before.timestamp())?;
        let not_after = to_utc(validity.not_after.timestamp())?;

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(str::to_string);
        let organization = cert
            .subject()
            .iter_organization()
            .next()
            .and_then(|o| o.as_str().ok())
            .map(str::to_string);

        let mut dns_names = Vec::new();
        let mut ip_addresses = Vec::new();
        if let Ok(Some(san)) = cert.subject_alternative_name() {
            for name in &san.value.general_names {
                match name {
                    GeneralName::DNSName(dns) => dns_names.push(dns.to_string()),
                    GeneralName::IPAddress(bytes) => {
                        if let Some(ip) = ip_from_bytes(bytes) {
                            ip_addresses.push(ip);
                        }
                    }
                    _ => {}
                }
            }
        }

        let (server_auth, client_auth) = match cert.extended_key_usage() {
            Ok(Some(eku)) => (eku.value.server_auth, eku.value.client_auth),
            _ => (false, false),
        };

        Ok(Self {
            common_name,
            organization,
            serial: cert.raw_serial_as_string(),
            not_before,
            not_after,
            dns_names,
            ip_addresses,
            is_ca: cert.is_ca(),
            server_auth,
            client_auth,
        })
    }

    /// Whether `host` appears among the DNS or IP SANs
    pub fn covers(&self, host: &str) -> bool {
        match host.parse::<IpAddr>() {
            Ok(ip) => self.ip_addresses.contains(&ip),
            Err(_) => self.dns_names.iter().any(|name| name == host),
        }
    }
}

/// Check that `cert_pem` carries a valid signature from the key of `issuer_pem`.
pub fn verify_issued_by(cert_pem: &str, issuer_pem: &str) -> Result<()> {
    let (_, cert_pem) = parse_x509_pem(cert_pem.as_bytes())
        .map_err(|e| Error::certificate(format!("failed to decode certificate PEM: {}", e)))?;
    let (_, issuer_pem) = parse_x509_pem(issuer_pem.as_bytes())
        .map_err(|e| Error::certificate(format!("failed to decode issuer PEM: {}", e)))?;
    let cert = cert_pem
        .parse_x509()
        .map_err(|e| Error::certificate(format!("failed to parse certificate: {}", e)))?;
    let issuer = issuer_pem
        .parse_x509()
        .map_err(|e| Error::certificate(format!("failed to parse issuer: {}", e)))?;

    if cert.issuer() != issuer.subject() {
        return Err(Error::certificate(format!(
            "certificate issuer '{}' does not match '{}'",
            cert.issuer(),
            issuer.subject()
        )));
    }
    cert.verify_signature(Some(issuer.public_key()))
        .map_err(|e| Error::certificate(format!("signature verification failed: {}", e)))
}

fn to_utc(timestamp: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp, 0)
        .ok_or_else(|| Error::certificate(format!("timestamp {} out of range", timestamp)))
}

fn ip_from_bytes(bytes: &[u8]) -> Option<IpAddr> {
    match bytes.len() {
        4 => <[u8; 4]>::try_from(bytes).ok().map(IpAddr::from),
        16 => <[u8; 16]>::try_from(bytes).ok().map(IpAddr::from),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_non_certificate_pem() {
        let err = CertificateInfo::from_pem("not a certificate").unwrap_err();
        assert!(matches!(err, Error::Certificate(_)));
    }

    #[test]
    fn test_ip_from_bytes() {
        assert_eq!(ip_from_bytes(&[127, 0, 0, 1]), Some("127.0.0.1".parse().unwrap()));
        assert_eq!(ip_from_bytes(&[1, 2, 3]), None);
    }
}
