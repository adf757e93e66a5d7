//! 자격증명(bearer 토큰), 사용자 신원, 역할 정의.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 사용자 역할.
///
/// 백엔드가 아직 알 수 없는 역할 문자열을 보내면 `Unknown`으로 역직렬화되며,
/// 라우터에서 "접근 불가"로 처리됩니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// 업로더 - 문서 업로드 및 서명자 지정
    Uploader,
    /// 서명자 - 지정된 문서 조회 및 서명
    Signer,
    /// 알 수 없는 역할
    #[serde(other)]
    Unknown,
}

impl Role {
    /// 문자열에서 역할 파싱 (대소문자 무시).
    ///
    /// 빈 문자열이나 알 수 없는 값은 `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "UPLOADER" => Some(Role::Uploader),
            "SIGNER" => Some(Role::Signer),
            _ => None,
        }
    }

    /// 알려진 역할인지 확인.
    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Unknown)
    }

    /// 와이어 표현 반환.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Uploader => "UPLOADER",
            Role::Signer => "SIGNER",
            Role::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 서버가 확인한 사용자 신원.
///
/// 제자리 수정하지 않고 항상 통째로 교체합니다.
/// 역직렬화 시 사용자 ID는 `id` 또는 `sub`에서 읽으며, 둘 다 있으면 `id`가 우선합니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawIdentity")]
pub struct Identity {
    /// 사용자 ID
    pub id: i64,
    /// 이메일
    pub email: String,
    /// 역할
    pub role: Role,
}

impl Identity {
    /// 새 신원 생성.
    pub fn new(id: i64, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            role,
        }
    }
}

/// 와이어 형식의 신원. 토큰 클레임 형태(`sub`)와 API 형태(`id`)를 모두 받습니다.
#[derive(Deserialize)]
struct RawIdentity {
    #[serde(default)]
    id: Option<RawId>,
    #[serde(default)]
    sub: Option<RawId>,
    email: String,
    role: Role,
}

/// 숫자 또는 숫자 문자열 형태의 사용자 ID.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

impl RawId {
    fn into_id(self) -> Result<i64, String> {
        match self {
            RawId::Number(n) => Ok(n),
            RawId::Text(s) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| format!("invalid user id: {}", s)),
        }
    }
}

impl TryFrom<RawIdentity> for Identity {
    type Error = String;

    fn try_from(raw: RawIdentity) -> Result<Self, Self::Error> {
        let id = raw
            .id
            .or(raw.sub)
            .ok_or_else(|| "missing user id (id or sub)".to_string())?
            .into_id()?;

        Ok(Self {
            id,
            email: raw.email,
            role: raw.role,
        })
    }
}

/// 원격 인증 서버가 발급한 불투명 bearer 토큰.
///
/// 내용은 `Debug` 출력이나 로그에 노출되지 않습니다.
pub struct Credential(SecretString);

impl Credential {
    /// 토큰 문자열로 자격증명 생성.
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token.into().into()))
    }

    /// 원본 토큰 문자열 반환 (헤더 구성용).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }

    /// 비어 있거나 공백뿐인 토큰인지 확인.
    pub fn is_blank(&self) -> bool {
        self.expose().trim().is_empty()
    }

    /// `Authorization` 헤더 값 반환.
    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.expose())
    }
}

impl Clone for Credential {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_owned())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Eq for Credential {}

impl From<&str> for Credential {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

impl From<String> for Credential {
    fn from(token: String) -> Self {
        Self::new(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!(Role::parse("UPLOADER"), Some(Role::Uploader));
        assert_eq!(Role::parse("signer"), Some(Role::Signer));
        assert_eq!(Role::parse(" Signer "), Some(Role::Signer));
        assert_eq!(Role::parse(""), None);
        assert_eq!(Role::parse("admin"), None);
    }

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Uploader).unwrap(), "\"UPLOADER\"");
        let parsed: Role = serde_json::from_str("\"SIGNER\"").unwrap();
        assert_eq!(parsed, Role::Signer);

        // 미래에 추가될 역할
        let future: Role = serde_json::from_str("\"AUDITOR\"").unwrap();
        assert_eq!(future, Role::Unknown);
        assert!(!future.is_known());
    }

    #[test]
    fn test_identity_accepts_sub_and_string_id() {
        let bare: Identity =
            serde_json::from_str(r#"{"id":1,"email":"a@x.com","role":"UPLOADER"}"#).unwrap();
        assert_eq!(bare, Identity::new(1, "a@x.com", Role::Uploader));

        let claims: Identity =
            serde_json::from_str(r#"{"sub":"42","email":"s@x.com","role":"SIGNER"}"#).unwrap();
        assert_eq!(claims, Identity::new(42, "s@x.com", Role::Signer));

        let bad = serde_json::from_str::<Identity>(r#"{"id":"abc","email":"a","role":"SIGNER"}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn test_identity_with_both_id_and_sub_prefers_id() {
        let both: Identity = serde_json::from_str(
            r#"{"id":7,"sub":"42","email":"s@x.com","role":"SIGNER"}"#,
        )
        .unwrap();
        assert_eq!(both.id, 7);

        let neither =
            serde_json::from_str::<Identity>(r#"{"email":"s@x.com","role":"SIGNER"}"#);
        assert!(neither.is_err());

        // 저장 형식은 항상 `id`
        let json = serde_json::to_value(&both).unwrap();
        assert_eq!(json["id"], 7);
        assert!(json.get("sub").is_none());
    }

    #[test]
    fn test_credential_is_redacted() {
        let cred = Credential::new("super-secret-token");
        assert_eq!(format!("{:?}", cred), "Credential([REDACTED])");
        assert_eq!(cred.expose(), "super-secret-token");
        assert_eq!(cred.bearer_header(), "Bearer super-secret-token");
    }

    #[test]
    fn test_credential_blank() {
        assert!(Credential::new("   ").is_blank());
        assert!(!Credential::new("abc").is_blank());
    }
}
