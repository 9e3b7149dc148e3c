//! The APNs provider certificate and the topics it carries

mod der;

use crate::error::Error;
use rustls::pki_types::{CertificateDer, PrivateKeyDer};
use std::fmt;

/// Marks a Universal Certificate, which embeds the topics it may push to.
pub const UNIVERSAL_CERTIFICATE_EXTENSION: &str = "1.2.840.113635.100.6.3.6";

/// Present on certificates valid for the development environment.
pub const DEVELOPMENT_ENV_EXTENSION: &str = "1.2.840.113635.100.6.3.1";

/// Present on certificates valid for the production environment.
pub const PRODUCTION_ENV_EXTENSION: &str = "1.2.840.113635.100.6.3.2";

const USER_ID: &str = "0.9.2342.19200300.100.1.1";

/// The topic type that marks the app itself, as opposed to e.g. `voip` or
/// `complication` topics.
const APP_TOPIC_TYPE: &str = "app";

/// A single X.509 extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extension {
    oid: String,
    critical: bool,
    value: Vec<u8>,
}

impl Extension {
    /// The dotted decimal extension identifier.
    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    /// The DER content of the `extnValue` octet string.
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

/// A client certificate with its private key, used both as the TLS identity
/// of a connection and as the source of the default topic.
///
/// Only the leaf certificate is inspected; any further certificates in the
/// chain are passed on to the TLS handshake.
pub struct Certificate {
    chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
    extensions: Vec<Extension>,
    app_bundle_id: Option<String>,
}

impl Certificate {
    /// Reads both the certificate and the private key from one PEM buffer.
    pub fn from_pem(pem: &[u8]) -> Result<Certificate, Error> {
        Self::from_parts(pem, pem)
    }

    /// Reads the certificate chain and the private key from separate PEM
    /// buffers. The first certificate is the client certificate.
    pub fn from_parts(mut cert_pem: &[u8], mut key_pem: &[u8]) -> Result<Certificate, Error> {
        let chain = rustls_pemfile::certs(&mut cert_pem).collect::<Result<Vec<_>, _>>()?;

        let key = rustls_pemfile::private_key(&mut key_pem)?
            .ok_or_else(|| Error::InvalidCertificate(String::from("no private key found")))?;

        let leaf = chain
            .first()
            .ok_or_else(|| Error::InvalidCertificate(String::from("no certificate found")))?;

        let (extensions, app_bundle_id) = parse_leaf(leaf)
            .ok_or_else(|| Error::InvalidCertificate(String::from("malformed X.509 certificate")))?;

        Ok(Certificate {
            chain,
            key,
            extensions,
            app_bundle_id,
        })
    }

    /// Reads a PKCS#12 archive, as exported from the keychain.
    ///
    /// Only works with the `openssl` feature.
    #[cfg(feature = "openssl")]
    pub fn from_pkcs12<R>(archive: &mut R, password: &str) -> Result<Certificate, Error>
    where
        R: std::io::Read,
    {
        let mut der: Vec<u8> = Vec::new();
        archive.read_to_end(&mut der)?;

        let pkcs = openssl::pkcs12::Pkcs12::from_der(&der)?.parse2(password)?;
        let Some((cert, pkey)) = pkcs.cert.zip(pkcs.pkey) else {
            return Err(Error::InvalidCertificate(String::from(
                "the archive has no certificate or private key",
            )));
        };

        let mut cert_pem = cert.to_pem()?;
        for ca in pkcs.ca.iter().flatten() {
            cert_pem.extend(ca.to_pem()?);
        }

        Self::from_parts(&cert_pem, &pkey.private_key_to_pem_pkcs8()?)
    }

    /// The private key followed by the certificate chain, PEM encoded.
    pub fn to_pem(&self) -> Vec<u8> {
        let mut pem = self.key_pem();

        for cert in &self.chain {
            pem.extend(encode_pem("CERTIFICATE", cert.as_ref()));
        }

        pem
    }

    /// The private key, PEM encoded.
    pub fn key_pem(&self) -> Vec<u8> {
        let label = match &self.key {
            PrivateKeyDer::Pkcs1(_) => "RSA PRIVATE KEY",
            PrivateKeyDer::Sec1(_) => "EC PRIVATE KEY",
            _ => "PRIVATE KEY",
        };

        encode_pem(label, self.key.secret_der())
    }

    /// The client certificate, DER encoded.
    pub fn der(&self) -> &[u8] {
        self.chain[0].as_ref()
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    pub fn extension(&self, oid: &str) -> Option<&Extension> {
        self.extensions.iter().find(|extension| extension.oid == oid)
    }

    /// A Universal Certificate can push to multiple topics.
    pub fn is_universal(&self) -> bool {
        self.extension(UNIVERSAL_CERTIFICATE_EXTENSION).is_some()
    }

    pub fn is_development(&self) -> bool {
        self.extension(DEVELOPMENT_ENV_EXTENSION).is_some()
    }

    pub fn is_production(&self) -> bool {
        self.extension(PRODUCTION_ENV_EXTENSION).is_some()
    }

    /// The `UID` of the certificate subject, which is the bundle ID of the app
    /// the certificate was issued for.
    pub fn app_bundle_id(&self) -> Option<&str> {
        self.app_bundle_id.as_deref()
    }

    /// All topics of a Universal Certificate, in the order they are listed.
    /// Empty for any other certificate.
    pub fn topics(&self) -> Vec<String> {
        self.universal_topics()
            .into_iter()
            .map(|(topic, _)| topic.to_string())
            .collect()
    }

    /// The app topic of a Universal Certificate, or its first topic if none is
    /// marked as the app. `None` for any other certificate, or if the topics
    /// can't be read.
    pub fn default_topic(&self) -> Option<String> {
        let topics = self.universal_topics();

        topics
            .iter()
            .find(|(_, types)| types.contains(&APP_TOPIC_TYPE))
            .or_else(|| topics.first())
            .map(|(topic, _)| topic.to_string())
    }

    /// Builds the TLS configuration presenting this certificate to APNs.
    pub(crate) fn client_config(&self) -> Result<rustls::ClientConfig, Error> {
        use hyper_rustls::ConfigBuilderExt;

        let config = rustls::ClientConfig::builder()
            .with_webpki_roots()
            .with_client_auth_cert(self.chain.clone(), self.key.clone_key())?;

        Ok(config)
    }

    fn universal_topics(&self) -> Vec<(&str, Vec<&str>)> {
        self.extension(UNIVERSAL_CERTIFICATE_EXTENSION)
            .and_then(|extension| parse_topics(extension.value()))
            .unwrap_or_default()
    }
}

impl Clone for Certificate {
    fn clone(&self) -> Self {
        Certificate {
            chain: self.chain.clone(),
            key: self.key.clone_key(),
            extensions: self.extensions.clone(),
            app_bundle_id: self.app_bundle_id.clone(),
        }
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("app_bundle_id", &self.app_bundle_id)
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

/// Reads the extensions and the subject UID from the TBS part of a
/// certificate.
fn parse_leaf(cert: &CertificateDer<'_>) -> Option<(Vec<Extension>, Option<String>)> {
    let certificate = der::Reader::new(cert.as_ref()).expect(der::SEQUENCE)?;
    let mut tbs = certificate.reader().expect(der::SEQUENCE)?.reader();

    if tbs.peek_tag() == Some(der::CONTEXT_0) {
        tbs.read()?;
    }

    // serial, signature algorithm, issuer, validity
    for _ in 0..4 {
        tbs.read()?;
    }

    let subject = tbs.expect(der::SEQUENCE)?;
    tbs.expect(der::SEQUENCE)?;

    let mut extensions = Vec::new();

    while !tbs.is_empty() {
        let field = tbs.read()?;

        if field.tag == der::CONTEXT_3 {
            extensions = parse_extensions(field)?;
        }
    }

    Some((extensions, find_attribute(subject, USER_ID)))
}

/// Extensions whose contents can't be read are left out; only a broken
/// extension list fails the parse.
fn parse_extensions(field: der::Tlv<'_>) -> Option<Vec<Extension>> {
    let mut list = field.reader().expect(der::SEQUENCE)?.reader();
    let mut extensions = Vec::new();

    while !list.is_empty() {
        let entry = list.expect(der::SEQUENCE)?;

        if let Some(extension) = parse_extension(entry) {
            extensions.push(extension);
        }
    }

    Some(extensions)
}

fn parse_extension(entry: der::Tlv<'_>) -> Option<Extension> {
    let mut extension = entry.reader();
    let oid = der::decode_oid(extension.expect(der::OBJECT_IDENTIFIER)?.value)?;

    let critical = if extension.peek_tag() == Some(der::BOOLEAN) {
        extension.read()?.value.first().map_or(false, |b| *b != 0)
    } else {
        false
    };

    let value = extension.expect(der::OCTET_STRING)?.value.to_vec();

    Some(Extension { oid, critical, value })
}

/// Looks up a string attribute in an X.501 name.
fn find_attribute(name: der::Tlv<'_>, oid: &str) -> Option<String> {
    let mut rdns = name.reader();

    while !rdns.is_empty() {
        let mut rdn = rdns.expect(der::SET)?.reader();

        while !rdn.is_empty() {
            let mut attribute = rdn.expect(der::SEQUENCE)?.reader();
            let attribute_oid = der::decode_oid(attribute.expect(der::OBJECT_IDENTIFIER)?.value)?;

            if attribute_oid == oid {
                return attribute.read()?.as_str().map(String::from);
            }
        }
    }

    None
}

/// The universal certificate extension is a sequence of topic strings, each
/// followed by a sequence listing the topic types.
fn parse_topics(value: &[u8]) -> Option<Vec<(&str, Vec<&str>)>> {
    let mut entries = der::Reader::new(value).expect(der::SEQUENCE)?.reader();
    let mut topics = Vec::new();

    while !entries.is_empty() {
        let topic = entries.read()?.as_str()?;
        let mut types = Vec::new();

        if entries.peek_tag() == Some(der::SEQUENCE) {
            let mut list = entries.read()?.reader();

            while !list.is_empty() {
                types.push(list.read()?.as_str()?);
            }
        }

        topics.push((topic, types));
    }

    Some(topics)
}

fn encode_pem(label: &str, der: &[u8]) -> Vec<u8> {
    pem::encode(&pem::Pem::new(label, der)).into_bytes()
}
