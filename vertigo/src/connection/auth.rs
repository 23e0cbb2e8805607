//! Password authentication.
use md5::{Digest, Md5};
use std::fmt;

use crate::protocol::backend::Authentication;

/// Password response for an `AuthenticationMD5Password` request.
///
/// `"md5" + hex(md5(hex(md5(password + user)) + salt))`
pub fn md5_password(user: &str, password: &str, salt: &[u8; 4]) -> String {
    let mut inner = Md5::new();
    inner.update(password.as_bytes());
    inner.update(user.as_bytes());
    let inner = format!("{:x}", inner.finalize());

    let mut outer = Md5::new();
    outer.update(inner.as_bytes());
    outer.update(salt);
    format!("md5{:x}", outer.finalize())
}

/// The password message content for an authentication request.
///
/// Returns `Ok(None)` for `AuthenticationOk`.
pub(crate) fn password_response(
    auth: &Authentication,
    user: &str,
    password: &str,
) -> Result<Option<String>, UnsupportedAuth> {
    match auth {
        Authentication::Ok => Ok(None),
        Authentication::CleartextPassword => Ok(Some(password.to_owned())),
        Authentication::MD5Password { salt } => Ok(Some(md5_password(user, password, salt))),
        other => Err(UnsupportedAuth { code: other.code() }),
    }
}

/// An error when server requests an authentication method that is not supported.
pub struct UnsupportedAuth {
    code: u32,
}

impl UnsupportedAuth {
    /// The authentication method code sent by the server.
    pub fn code(&self) -> u32 {
        self.code
    }

    fn method(&self) -> &'static str {
        match self.code {
            2 => "KerberosV5",
            4 => "crypt",
            6 => "SCM credential",
            7 | 8 => "GSSAPI",
            9 => "SSPI",
            10..=12 => "SASL",
            _ => "unknown",
        }
    }
}

impl std::error::Error for UnsupportedAuth { }

impl fmt::Display for UnsupportedAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unsupported authentication method: {} ({})",
            self.method(),
            itoa::Buffer::new().format(self.code),
        )
    }
}

impl fmt::Debug for UnsupportedAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn md5_vector() {
        assert_eq!(
            md5_password("md5_user", "password", &[0x2a, 0x3d, 0x8f, 0xe0]),
            "md562af4dd09bbb41884907a838a3233294"
        );
    }

    #[test]
    fn responses() {
        assert_eq!(password_response(&Authentication::Ok, "u", "p").unwrap(), None);
        assert_eq!(
            password_response(&Authentication::CleartextPassword, "u", "p").unwrap().as_deref(),
            Some("p")
        );
        let md5 = password_response(&Authentication::MD5Password { salt: *b"abcd" }, "u", "p")
            .unwrap()
            .unwrap();
        assert!(md5.starts_with("md5"));
        assert_eq!(md5.len(), 35);

        let err = password_response(&Authentication::CryptPassword { salt: *b"ab" }, "u", "p")
            .unwrap_err();
        assert_eq!(err.code(), 4);
        assert_eq!(err.to_string(), "unsupported authentication method: crypt (4)");
    }
}
