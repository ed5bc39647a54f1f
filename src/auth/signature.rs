use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(secret: &str, timestamp: &str, method: &str, path: &str, body: &[u8]) -> HmacSha256 {
    // HMAC 接受任意长度的密钥
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac key length is unrestricted"),
    };
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(method.as_bytes());
    mac.update(b".");
    mac.update(path.as_bytes());
    mac.update(b".");
    mac.update(body);
    mac
}

/// 计算 `timestamp.method.path.body` 的十六进制签名
pub fn sign(secret: &str, timestamp: &str, method: &str, path: &str, body: &[u8]) -> String {
    let mac = mac_for(secret, timestamp, method, path, body);
    hex::encode(mac.finalize().into_bytes())
}

/// 以常量时间比较校验十六进制签名
///
/// 无法解码的十六进制或长度不符一律拒绝
pub fn verify(
    secret: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &[u8],
    signature_hex: &str,
) -> bool {
    let Ok(provided) = hex::decode(signature_hex) else {
        return false;
    };
    mac_for(secret, timestamp, method, path, body)
        .verify_slice(&provided)
        .is_ok()
}
