//! Certificate issuance for the CA, node and client roles.
//!
//! All functions here are CPU bound (RSA key generation dominates) and are
//! meant to run on a blocking thread.

use chrono::{DateTime, Utc};
use rand::RngCore;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, DnValue,
    ExtendedKeyUsagePurpose, IsCa, Issuer, KeyUsagePurpose, SerialNumber,
};
use rsa::RsaPrivateKey;
use std::time::Duration;

use super::hosts::HostSet;
use super::keys;
use crate::domain::{CaMaterial, CredentialBundle, KeyEncoding};
use crate::errors::{Error, Result};

pub const CA_COMMON_NAME: &str = "Cockroach CA";
pub const NODE_COMMON_NAME: &str = "node";
pub const ORGANIZATION: &str = "Cockroach";

const SERIAL_LEN: usize = 20;

/// Issue a self-signed CA certificate.
///
/// When `existing_key` is given it is reused and only the certificate is
/// regenerated, so already issued leaf certificates keep verifying.
pub fn issue_ca(
    existing_key: Option<RsaPrivateKey>,
    key_size: usize,
    validity: Duration,
) -> Result<CredentialBundle> {
    let key = match existing_key {
        Some(key) => key,
        None => keys::generate_private_key(key_size)?,
    };
    let (not_before, not_after) = validity_window(validity)?;

    let mut params = base_params(CA_COMMON_NAME, not_before, not_after)?;
    params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
    params.key_usages = vec![
        KeyUsagePurpose::DigitalSignature,
        KeyUsagePurpose::KeyCertSign,
        KeyUsagePurpose::CrlSign,
    ];

    let key_pair = keys::signing_key_pair(&key)?;
    let cert = params
        .self_signed(&key_pair)
        .map_err(|e| Error::signing(format!("failed to self-sign CA certificate: {}", e)))?;

    Ok(CredentialBundle {
        private_key: keys::encode_private_key(&key, KeyEncoding::Pkcs1)?,
        certificate: cert.pem(),
        ca_certificate: None,
        not_before,
        not_after,
        declared_duration: validity,
    })
}

/// Issue a node certificate valid for every host in `hosts`, usable as both
/// server and client.
pub fn issue_node(
    ca: &CaMaterial,
    hosts: &HostSet,
    key_size: usize,
    validity: Duration,
) -> Result<CredentialBundle> {
    let (not_before, not_after) = validity_window(validity)?;

    let mut params = base_params(NODE_COMMON_NAME, not_before, not_after)?;
    params.subject_alt_names = hosts.to_san_types()?;
    params.extended_key_usages =
        vec![ExtendedKeyUsagePurpose::ServerAuth, ExtendedKeyUsagePurpose::ClientAuth];

    issue_leaf(ca, params, key_size, KeyEncoding::Pkcs1, not_before, not_after, validity)
}

/// Issue a client certificate whose common name is `principal`.
pub fn issue_client(
    ca: &CaMaterial,
    principal: &str,
    key_size: usize,
    validity: Duration,
    encoding: KeyEncoding,
) -> Result<CredentialBundle> {
    let (not_before, not_after) = validity_window(validity)?;

    let mut params = base_params(principal, not_before, not_after)?;
    params.extended_key_usages = vec![ExtendedKeyUsagePurpose::ClientAuth];

    issue_leaf(ca, params, key_size, encoding, not_before, not_after, validity)
}

fn issue_leaf(
    ca: &CaMaterial,
    mut params: CertificateParams,
    key_size: usize,
    encoding: KeyEncoding,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    validity: Duration,
) -> Result<CredentialBundle> {
    params.is_ca = IsCa::NoCa;
    params.key_usages = vec![KeyUsagePurpose::DigitalSignature, KeyUsagePurpose::KeyEncipherment];
    params.use_authority_key_identifier_extension = true;

    let ca_key = keys::decode_private_key(ca.key_pem.expose_secret())?;
    let ca_key_pair = keys::signing_key_pair(&ca_key)?;
    let issuer = Issuer::from_ca_cert_pem(&ca.cert_pem, &ca_key_pair)
        .map_err(|e| Error::signing(format!("failed to load CA certificate: {}", e)))?;

    let key = keys::generate_private_key(key_size)?;
    let key_pair = keys::signing_key_pair(&key)?;
    let cert = params
        .signed_by(&key_pair, &issuer)
        .map_err(|e| Error::signing(format!("failed to sign certificate: {}", e)))?;

    Ok(CredentialBundle {
        private_key: keys::encode_private_key(&key, encoding)?,
        certificate: cert.pem(),
        ca_certificate: Some(ca.cert_pem.clone()),
        not_before,
        not_after,
        declared_duration: validity,
    })
}

fn base_params(
    common_name: &str,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
) -> Result<CertificateParams> {
    let mut dn = DistinguishedName::new();
    dn.push(DnType::OrganizationName, DnValue::Utf8String(ORGANIZATION.to_string()));
    dn.push(DnType::CommonName, DnValue::Utf8String(common_name.to_string()));

    let mut params = CertificateParams::default();
    params.distinguished_name = dn;
    params.not_before = to_offset(not_before)?;
    params.not_after = to_offset(not_after)?;
    params.serial_number = Some(random_serial());
    Ok(params)
}

/// Validity starting now, truncated to whole seconds so the certificate and
/// its annotations agree exactly.
fn validity_window(validity: Duration) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let now = Utc::now().timestamp();
    let not_before = DateTime::from_timestamp(now, 0)
        .ok_or_else(|| Error::signing("current time out of range"))?;
    let span = chrono::Duration::from_std(validity)
        .map_err(|e| Error::signing(format!("validity {:?} out of range: {}", validity, e)))?;
    let not_after = not_before
        .checked_add_signed(span)
        .ok_or_else(|| Error::signing(format!("validity {:?} overflows", validity)))?;
    Ok((not_before, not_after))
}

fn to_offset(ts: DateTime<Utc>) -> Result<time::OffsetDateTime> {
    time::OffsetDateTime::from_unix_timestamp(ts.timestamp())
        .map_err(|e| Error::signing(format!("timestamp {} out of range: {}", ts, e)))
}

/// Random positive serial; the top bit is cleared and the next one set so the
/// DER integer always keeps its full length.
fn random_serial() -> SerialNumber {
    SerialNumber::from_slice(&serial_bytes())
}

fn serial_bytes() -> [u8; SERIAL_LEN] {
    let mut bytes = [0u8; SERIAL_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes[0] = (bytes[0] & 0x7f) | 0x40;
    bytes
}
