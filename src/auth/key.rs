//! Key-pair loading for JWT client assertions.
//!
//! [`FileKeyReader`] accepts PKCS#1 (`RSA PRIVATE KEY`), PKCS#8 (`PRIVATE KEY`) and
//! password-protected PKCS#8 (`ENCRYPTED PRIVATE KEY`) PEM files for the private half, and a
//! PEM or raw DER public key whose DER bytes feed [`compute_key_id`].

// std
use std::{
	fs,
	path::{Path, PathBuf},
};
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::EncodingKey;
use pkcs8::{EncryptedPrivateKeyInfo, ObjectIdentifier, PrivateKeyInfo, der::Document};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, auth::Secret};

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
const PEM_PREFIX: &[u8] = b"-----BEGIN";

/// Key loading and signing failures.
#[derive(Debug, ThisError)]
pub enum KeyError {
	/// The key file cannot be read.
	#[error("Failed to read key file {}.", path.display())]
	Io {
		/// Key file path.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// The key file is not valid PEM/DER.
	#[error("Key file {} cannot be decoded.", path.display())]
	Decode {
		/// Key file path.
		path: PathBuf,
		/// Underlying decoding failure.
		#[source]
		source: pkcs8::Error,
	},
	/// The private key is encrypted and no password was configured.
	#[error("Key file {} is encrypted but no password was provided.", path.display())]
	MissingPassword {
		/// Key file path.
		path: PathBuf,
	},
	/// The private key could not be decrypted with the configured password.
	#[error("Key file {} could not be decrypted.", path.display())]
	Decrypt {
		/// Key file path.
		path: PathBuf,
		/// Underlying decryption failure.
		#[source]
		source: pkcs8::Error,
	},
	/// The key file holds something other than an RSA key.
	#[error("Key file {} holds an unsupported `{kind}` key.", path.display())]
	UnsupportedKey {
		/// Key file path.
		path: PathBuf,
		/// PEM label or algorithm OID that was found.
		kind: String,
	},
	/// JWT signing failed.
	#[error("Failed to sign the client assertion.")]
	Sign(#[source] jsonwebtoken::errors::Error),
}

/// RSA private key ready for JWT signing.
#[derive(Clone)]
pub struct PrivateKey(EncodingKey);
impl PrivateKey {
	/// Wraps a PKCS#1 DER-encoded RSA private key.
	pub fn from_pkcs1_der(der: &[u8]) -> Self {
		Self(EncodingKey::from_rsa_der(der))
	}

	/// Returns the signing key.
	pub fn encoding_key(&self) -> &EncodingKey {
		&self.0
	}
}
impl Debug for PrivateKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("PrivateKey(<redacted>)")
	}
}

/// Storage-agnostic key loader consumed by the private-key JWT authenticator.
pub trait KeyReader
where
	Self: Send + Sync,
{
	/// Loads the private key, decrypting it with `password` when needed.
	fn read_private_key(&self, path: &Path, password: Option<&Secret>)
	-> Result<PrivateKey, KeyError>;

	/// Loads the DER encoding of the public key.
	fn read_public_key(&self, path: &Path) -> Result<Vec<u8>, KeyError>;
}

/// [`KeyReader`] backed by the local filesystem.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileKeyReader;
impl KeyReader for FileKeyReader {
	fn read_private_key(
		&self,
		path: &Path,
		password: Option<&Secret>,
	) -> Result<PrivateKey, KeyError> {
		let (label, document) = read_pem(path)?;

		match label.as_str() {
			"RSA PRIVATE KEY" => Ok(PrivateKey::from_pkcs1_der(document.as_bytes())),
			"PRIVATE KEY" => pkcs8_to_private_key(path, document.as_bytes()),
			"ENCRYPTED PRIVATE KEY" => {
				let password = password
					.filter(|p| !p.is_empty())
					.ok_or_else(|| KeyError::MissingPassword { path: path.to_owned() })?;
				let decrypt = |source| KeyError::Decrypt { path: path.to_owned(), source };
				let encrypted = EncryptedPrivateKeyInfo::try_from(document.as_bytes())
					.map_err(|e| decrypt(pkcs8::Error::from(e)))?;
				let decrypted = encrypted.decrypt(password.expose()).map_err(decrypt)?;

				pkcs8_to_private_key(path, decrypted.as_bytes())
			},
			other => Err(KeyError::UnsupportedKey { path: path.to_owned(), kind: other.to_owned() }),
		}
	}

	fn read_public_key(&self, path: &Path) -> Result<Vec<u8>, KeyError> {
		let raw = fs::read(path).map_err(|source| KeyError::Io { path: path.to_owned(), source })?;

		if !raw.trim_ascii_start().starts_with(PEM_PREFIX) {
			return Ok(raw);
		}

		let (label, document) = decode_pem(path, &raw)?;

		match label.as_str() {
			"PUBLIC KEY" | "RSA PUBLIC KEY" => Ok(document.as_bytes().to_vec()),
			other => Err(KeyError::UnsupportedKey { path: path.to_owned(), kind: other.to_owned() }),
		}
	}
}

/// Computes the JWT `kid` for a DER-encoded public key.
///
/// The ID is the unpadded base64url encoding of the SHA-256 digest of the DER bytes.
pub fn compute_key_id(der: &[u8]) -> String {
	URL_SAFE_NO_PAD.encode(Sha256::digest(der))
}

fn read_pem(path: &Path) -> Result<(String, Document), KeyError> {
	let raw = fs::read(path).map_err(|source| KeyError::Io { path: path.to_owned(), source })?;

	decode_pem(path, &raw)
}

fn decode_pem(path: &Path, raw: &[u8]) -> Result<(String, Document), KeyError> {
	let decode = |source| KeyError::Decode { path: path.to_owned(), source };
	let text = std::str::from_utf8(raw)
		.map_err(|_| decode(pkcs8::Error::KeyMalformed))?
		.trim();
	let (label, document) = Document::from_pem(text).map_err(|e| decode(pkcs8::Error::from(e)))?;

	Ok((label.to_owned(), document))
}

fn pkcs8_to_private_key(path: &Path, der: &[u8]) -> Result<PrivateKey, KeyError> {
	let info = PrivateKeyInfo::try_from(der)
		.map_err(|e| KeyError::Decode { path: path.to_owned(), source: pkcs8::Error::from(e) })?;

	if info.algorithm.oid != RSA_ENCRYPTION {
		return Err(KeyError::UnsupportedKey {
			path: path.to_owned(),
			kind: info.algorithm.oid.to_string(),
		});
	}

	Ok(PrivateKey::from_pkcs1_der(info.private_key))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	const FIXTURE_KID: &str = "Z5cSFZNyjkNamaBSfWCa1m_QIseAuDpO3-3AyQ8iIA8";

	fn fixture(name: &str) -> PathBuf {
		Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
	}

	#[test]
	fn public_key_id_matches_sha256_of_der() {
		let der = FileKeyReader
			.read_public_key(&fixture("public_key.pem"))
			.expect("Public key fixture should load.");

		assert_eq!(compute_key_id(&der), FIXTURE_KID);
	}

	#[test]
	fn reads_plain_and_encrypted_private_keys() {
		FileKeyReader
			.read_private_key(&fixture("private_key.pem"), None)
			.expect("Plain PKCS#8 key should load.");

		let password = Secret::new("fixture-pass");

		FileKeyReader
			.read_private_key(&fixture("private_key_encrypted.pem"), Some(&password))
			.expect("Encrypted PKCS#8 key should load with the right password.");
	}

	#[test]
	fn encrypted_key_requires_the_right_password() {
		let path = fixture("private_key_encrypted.pem");

		assert!(matches!(
			FileKeyReader.read_private_key(&path, None),
			Err(KeyError::MissingPassword { .. })
		));

		let wrong = Secret::new("not-the-password");

		assert!(matches!(
			FileKeyReader.read_private_key(&path, Some(&wrong)),
			Err(KeyError::Decrypt { .. })
		));
	}

	#[test]
	fn public_key_is_not_a_private_key() {
		assert!(matches!(
			FileKeyReader.read_private_key(&fixture("public_key.pem"), None),
			Err(KeyError::UnsupportedKey { kind, .. }) if kind == "PUBLIC KEY"
		));
	}

	#[test]
	fn missing_file_reports_io_error() {
		assert!(matches!(
			FileKeyReader.read_public_key(&fixture("absent.pem")),
			Err(KeyError::Io { .. })
		));
	}

	#[test]
	fn private_key_debug_is_redacted() {
		let key = FileKeyReader
			.read_private_key(&fixture("private_key.pem"), None)
			.expect("Plain PKCS#8 key should load.");

		assert_eq!(format!("{key:?}"), "PrivateKey(<redacted>)");
	}
}
