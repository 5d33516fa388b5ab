// SPDX-License-Identifier: Apache-2.0
//! Extracts the fields shown by the frontend from PKCS#10 certification
//! requests: subject name attributes, the signature algorithm, and the
//! additional name attributes listed under `subjectAltName`.

use bcder::{
    decode::{self, Constructed},
    BitString, Integer, Mode,
};
use log::{debug, warn};
use serde::Serialize;
use x509_certificate::{
    rfc3280::{AttributeTypeAndValue, Name},
    rfc5280::{AlgorithmIdentifier, SubjectPublicKeyInfo},
};

/// Fields of one parsed request, in the shape `/api/parse-csr` returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedCsr {
    pub subject: Vec<String>,
    pub public_key_algorithm: String,
    pub subject_alt_name: Vec<String>,
}

#[derive(Debug)]
pub enum CsrError {
    /// No armor with a certification request label was found.
    NotPem,
    /// The armored payload is not valid base64.
    Base64(base64::DecodeError),
    /// The decoded payload is not a PKCS#10 structure.
    Der(decode::Error),
}

// X.500 attributes shown in the subject list, keyed by OID contents.
const SUBJECT_ATTRS: &[(&[u8], &str)] = &[
    // 2.5.4.6
    (&[85, 4, 6], "Country Name (C)"),
    // 2.5.4.8
    (&[85, 4, 8], "State or Province Name (ST)"),
    // 2.5.4.7
    (&[85, 4, 7], "Locality Name (L)"),
    // 2.5.4.10
    (&[85, 4, 10], "Organization Name (O)"),
    // 2.5.4.11
    (&[85, 4, 11], "Organizational Unit (OU)"),
    // 2.5.4.3
    (&[85, 4, 3], "Common Name (CN)"),
];

// Attributes shown in the alternative name list. These are drawn from the
// same RDN sequence as the subject, not from an extension.
const ALT_NAME_ATTRS: &[(&[u8], &str)] = &[
    // 2.5.4.4
    (&[85, 4, 4], "Surname"),
    // 2.5.4.42
    (&[85, 4, 42], "Given Name"),
    // 2.5.4.12
    (&[85, 4, 12], "Title"),
    // 1.2.840.113549.1.9.1
    (&[42, 134, 72, 134, 247, 13, 1, 9, 1], "Email Address"),
];

// Signature algorithms with a human-readable name.
const ALGORITHMS: &[(&[u8], &str)] = &[
    // 1.2.840.113549.1.1.5
    (&[42, 134, 72, 134, 247, 13, 1, 1, 5], "SHA-1 with RSA"),
    // 1.2.840.113549.1.1.11
    (&[42, 134, 72, 134, 247, 13, 1, 1, 11], "SHA-256 with RSA"),
    // 1.2.840.113549.1.1.12
    (&[42, 134, 72, 134, 247, 13, 1, 1, 12], "SHA-384 with RSA"),
    // 1.2.840.113549.1.1.13
    (&[42, 134, 72, 134, 247, 13, 1, 1, 13], "SHA-512 with RSA"),
    // 1.2.840.10045.4.3.2
    (&[42, 134, 72, 206, 61, 4, 3, 2], "SHA-256 with ECDSA"),
];

/// Shown when the signature algorithm OID is not in the table.
pub const UNKNOWN_ALGORITHM: &str = "Unknown Algorithm";

const PEM_LABELS: &[&str] = &["CERTIFICATE REQUEST", "NEW CERTIFICATE REQUEST"];

/// Parses a PEM-armored PKCS#10 certification request.
pub fn parse_pem(data: &[u8]) -> Result<ParsedCsr, CsrError> {
    let der = pem_to_der(data)?;
    parse_der(&der)
}

/// Parses a DER-encoded PKCS#10 certification request.
pub fn parse_der(der: &[u8]) -> Result<ParsedCsr, CsrError> {
    let (subject, signature_algorithm) = Constructed::decode(der, Mode::Der, |cons| {
        cons.take_sequence(|cons| {
            let subject = cons.take_sequence(|cons| {
                let _version = Integer::take_from(cons)?;
                let subject = Name::take_from(cons)?;
                SubjectPublicKeyInfo::take_from(cons)?;
                // attributes, [0] IMPLICIT SET OF Attribute
                cons.capture_all()?;
                Ok(subject)
            })?;
            let signature_algorithm = AlgorithmIdentifier::take_from(cons)?;
            BitString::take_from(cons)?;
            Ok((subject, signature_algorithm))
        })
    })
    .map_err(CsrError::Der)?;

    Ok(ParsedCsr {
        subject: mapped_attrs(&subject, SUBJECT_ATTRS),
        public_key_algorithm: algorithm_name(signature_algorithm.algorithm.as_ref()).to_string(),
        subject_alt_name: mapped_attrs(&subject, ALT_NAME_ATTRS),
    })
}

fn pem_to_der(data: &[u8]) -> Result<Vec<u8>, CsrError> {
    let text = String::from_utf8_lossy(data);
    let mut body = String::new();
    let mut in_armor = false;
    let mut found = false;
    for line in text.lines() {
        let line = line.trim();
        if let Some(label) = line
            .strip_prefix("-----BEGIN ")
            .and_then(|rest| rest.strip_suffix("-----"))
        {
            if !PEM_LABELS.iter().any(|l| *l == label) {
                return Err(CsrError::NotPem);
            }
            in_armor = true;
            found = true;
        } else if line.starts_with("-----END ") {
            in_armor = false;
        } else if in_armor {
            body.push_str(line);
        }
    }
    if !found || body.is_empty() {
        return Err(CsrError::NotPem);
    }
    base64::decode(&body).map_err(CsrError::Base64)
}

/// Collects `"<label>= <value>"` entries for every attribute of `subject`
/// that appears in `table`, in RDN sequence order.
fn mapped_attrs(subject: &Name, table: &[(&[u8], &str)]) -> Vec<String> {
    let mut entries = Vec::new();
    for rdn in subject.iter() {
        for attr in rdn.iter() {
            match table.iter().find(|(oid, _)| attr.typ.as_ref() == *oid) {
                Some((_, label)) => {
                    let value = attr_value(attr);
                    entries.push(format!("{}= {}", label, String::from_utf8_lossy(&value)));
                }
                None => debug!("skipping subject attribute with OID {}", attr.typ),
            }
        }
    }
    entries
}

/// Decodes an attribute value as one of the string types requests carry.
/// Undecodable values fall back to the raw bytes.
fn attr_value(attr: &AttributeTypeAndValue) -> Vec<u8> {
    let bytes = (**attr.value).clone();
    let str_decode = Constructed::decode(bytes.clone(), Mode::Ber, |cons| {
        if let Ok(s) = bcder::Utf8String::take_from(cons) {
            return Ok(s.to_bytes());
        }
        if let Ok(s) = bcder::PrintableString::take_from(cons) {
            return Ok(s.to_bytes());
        }
        if let Ok(s) = bcder::Ia5String::take_from(cons) {
            return Ok(s.to_bytes());
        }
        Err(decode::Error::Malformed)
    });
    match str_decode {
        Ok(s) => s.to_vec(),
        Err(_) => {
            warn!("request has undecodable value for attribute {}", attr.typ);
            bytes.to_vec()
        }
    }
}

fn algorithm_name(oid: &[u8]) -> &'static str {
    match ALGORITHMS.iter().find(|(alg, _)| *alg == oid) {
        Some((_, name)) => name,
        None => {
            debug!("unrecognized signature algorithm OID");
            UNKNOWN_ALGORITHM
        }
    }
}
