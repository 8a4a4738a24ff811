use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// 十六进制 SHA-256 摘要长度
const SIGNATURE_HEX_LEN: usize = 64;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Missing callback signature")]
    Missing,

    #[error("Invalid callback signature")]
    Invalid,
}

fn keyed_mac(secret: &str) -> Result<HmacSha256, SignatureError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::Invalid)
}

/// 计算请求体的 HMAC-SHA256 签名（小写十六进制）
pub fn compute_signature(secret: &str, body: &[u8]) -> Result<String, SignatureError> {
    let mut mac = keyed_mac(secret)?;
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// n8n 回调签名校验
///
/// 未配置密钥时放行所有回调并记录告警；配置了密钥时必须携带与原始请求体
/// 匹配的签名。比较通过 `Mac::verify_slice` 完成，耗时与输入内容无关。
#[derive(Clone, Default)]
pub struct CallbackVerifier {
    secret: Option<String>,
}

impl std::fmt::Debug for CallbackVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CallbackVerifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl CallbackVerifier {
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    pub fn verify(&self, body: &[u8], provided: Option<&str>) -> Result<(), SignatureError> {
        let Some(secret) = self.secret.as_deref() else {
            warn!("callback signature not validated (secret missing)");
            return Ok(());
        };

        let Some(provided) = provided.filter(|p| !p.is_empty()) else {
            warn!("callback signature missing");
            return Err(SignatureError::Missing);
        };

        let expected = decode_signature(provided).ok_or_else(|| {
            warn!("callback signature invalid");
            SignatureError::Invalid
        })?;

        let mut mac = keyed_mac(secret)?;
        mac.update(body);
        mac.verify_slice(&expected).map_err(|_| {
            warn!("callback signature invalid");
            SignatureError::Invalid
        })
    }
}

/// 只接受 64 位小写十六进制
fn decode_signature(provided: &str) -> Option<Vec<u8>> {
    let well_formed = provided.len() == SIGNATURE_HEX_LEN
        && provided
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
    if !well_formed {
        return None;
    }
    hex::decode(provided).ok()
}
