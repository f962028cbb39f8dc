// Router authentication
//
// Two mechanisms: username/password login, which returns a `pauth`
// session cookie, and OAuth-style client-credential grants, which return
// an access token passed as the `accessToken` query parameter.

use std::time::Duration;

use reqwest::header::{COOKIE, SET_COOKIE};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::client::{PeplinkClient, decode_envelope};
use crate::error::Error;

const LOGIN_PATH: &str = "/api/login";
const TOKEN_GRANT_PATH: &str = "/api/auth.token.grant";
const SESSION_COOKIE: &str = "pauth";

/// Credential presented on every authenticated request.
#[derive(Debug, Clone)]
pub enum Session {
    /// Value of the `pauth` cookie set by `/api/login`.
    Cookie(SecretString),
    /// Access token from `/api/auth.token.grant`.
    AccessToken(SecretString),
}

impl Session {
    pub(crate) fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self {
            Self::Cookie(pauth) => request.header(
                COOKIE,
                format!("{SESSION_COOKIE}={}", pauth.expose_secret()),
            ),
            Self::AccessToken(token) => request.query(&[("accessToken", token.expose_secret())]),
        }
    }
}

/// Result of a client-credential grant.
#[derive(Debug, Clone)]
pub struct TokenGrant {
    pub session: Session,
    /// Lifetime reported by the router, when it reports one.
    pub expires_in: Option<Duration>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTokenGrant {
    access_token: Option<String>,
    expires_in: Option<u64>,
}

impl PeplinkClient {
    /// Log in with the router's admin credentials.
    ///
    /// On success the `pauth` cookie from `Set-Cookie` becomes the session.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<Session, Error> {
        let url = self.url(LOGIN_PATH)?;
        debug!("logging in at {}", url.path());

        let body = json!({
            "username": username,
            "password": password.expose_secret(),
            "challenge": "challenge",
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("login rejected (HTTP {status})"),
            });
        }
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                path: LOGIN_PATH.into(),
            });
        }

        let cookie = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(session_cookie);

        let text = resp.text().await.map_err(|e| self.send_error(e))?;
        match decode_envelope::<serde_json::Value>(LOGIN_PATH, &text) {
            Ok(_) => {}
            Err(Error::Api { message, .. }) => return Err(Error::Authentication { message }),
            Err(Error::SessionExpired) => {
                return Err(Error::Authentication {
                    message: "credentials rejected".into(),
                });
            }
            Err(other) => return Err(other),
        }

        let pauth = cookie.ok_or_else(|| Error::Authentication {
            message: "login succeeded but no session cookie was set".into(),
        })?;

        debug!("login successful");
        Ok(Session::Cookie(SecretString::from(pauth)))
    }

    /// Exchange client credentials for an access token.
    pub async fn grant_token(
        &self,
        client_id: &str,
        client_secret: &SecretString,
    ) -> Result<TokenGrant, Error> {
        let url = self.url(TOKEN_GRANT_PATH)?;
        debug!("requesting access token at {}", url.path());

        let body = json!({
            "clientId": client_id,
            "clientSecret": client_secret.expose_secret(),
            "scope": "api",
        });

        let resp = self
            .http()
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::Authentication {
                message: format!("token grant rejected (HTTP {status})"),
            });
        }
        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                path: TOKEN_GRANT_PATH.into(),
            });
        }

        let text = resp.text().await.map_err(|e| self.send_error(e))?;
        let grant: RawTokenGrant = match decode_envelope(TOKEN_GRANT_PATH, &text) {
            Ok(grant) => grant,
            Err(Error::Api { message, .. }) => return Err(Error::Authentication { message }),
            Err(Error::SessionExpired) => {
                return Err(Error::Authentication {
                    message: "client credentials rejected".into(),
                });
            }
            Err(other) => return Err(other),
        };

        let token = grant
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::Authentication {
                message: "token grant response carried no access token".into(),
            })?;

        debug!("access token granted");
        Ok(TokenGrant {
            session: Session::AccessToken(SecretString::from(token)),
            expires_in: grant.expires_in.map(Duration::from_secs),
        })
    }
}

/// Extract the `pauth` value from one `Set-Cookie` header.
fn session_cookie(header: &str) -> Option<String> {
    let pair = header.split(';').next()?.trim();
    let (name, value) = pair.split_once('=')?;
    (name.trim() == SESSION_COOKIE && !value.is_empty()).then(|| value.trim().to_owned())
}

#[cfg(test)]
mod tests {
    use super::session_cookie;

    #[test]
    fn extracts_pauth_cookie() {
        assert_eq!(
            session_cookie("pauth=abc123; Path=/; HttpOnly").as_deref(),
            Some("abc123")
        );
    }

    #[test]
    fn ignores_other_cookies() {
        assert_eq!(session_cookie("bauth=zzz; Path=/"), None);
        assert_eq!(session_cookie("pauth=; Path=/"), None);
    }
}
