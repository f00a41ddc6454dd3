use ring::signature::{Ed25519KeyPair, Signature};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

/// Signing key definition
pub trait SigningKey {
    /// Type the signature algorithm outputs
    type Output: AsRef<[u8]>;

    /// Sign a message
    ///
    /// The message is signed as-is, without hashing it first
    fn sign(&self, msg: &[u8]) -> Self::Output;
}

impl SigningKey for Ed25519KeyPair {
    type Output = Signature;

    #[inline]
    fn sign(&self, msg: &[u8]) -> Self::Output {
        self.sign(msg)
    }
}

/// Text encoding of the signature bytes
#[derive(AsRefStr, Clone, Copy, Debug, Default, Deserialize, EnumString, PartialEq, Eq, Serialize)]
pub enum SignatureEncoding {
    /// Standard Base64 alphabet with padding
    #[default]
    #[serde(rename = "base64")]
    #[strum(serialize = "base64")]
    Base64,

    /// URL-safe Base64 alphabet without padding
    #[serde(rename = "base64url")]
    #[strum(serialize = "base64url")]
    Base64Url,
}

impl SignatureEncoding {
    /// Encode the signature bytes
    #[must_use]
    pub fn encode(self, data: &[u8]) -> String {
        match self {
            Self::Base64 => base64_simd::STANDARD.encode_to_string(data),
            Self::Base64Url => base64_simd::URL_SAFE_NO_PAD.encode_to_string(data),
        }
    }

    /// Decode the signature bytes
    pub fn decode(self, encoded: &str) -> Result<Vec<u8>, base64_simd::Error> {
        match self {
            Self::Base64 => base64_simd::STANDARD.decode_to_vec(encoded),
            Self::Base64Url => base64_simd::URL_SAFE_NO_PAD.decode_to_vec(encoded),
        }
    }
}

/// Sign a message with the provided signing key and encode the returned signature
#[inline]
pub fn sign<SK>(payload: &[u8], key: &SK, encoding: SignatureEncoding) -> String
where
    SK: SigningKey + ?Sized,
{
    encoding.encode(key.sign(payload).as_ref())
}

#[cfg(test)]
mod test {
    use super::SignatureEncoding;

    #[test]
    fn encodings_differ_in_alphabet() {
        let data = [0xfb, 0xff, 0xbf];

        assert_eq!(SignatureEncoding::Base64.encode(&data), "+/+/");
        assert_eq!(SignatureEncoding::Base64Url.encode(&data), "-_-_");
        assert_eq!(SignatureEncoding::Base64Url.decode("-_-_").unwrap(), data);
        assert!(SignatureEncoding::Base64.decode("-_-_").is_err());
    }
}
