//! Access token renewal

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::{ClientError, Gateway, resolve};

/// Refresh endpoint, relative to the API base
pub const REFRESH_PATH: &str = "token/refresh/";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}

impl Gateway {
    /// Exchange the stored refresh token for a new access token
    ///
    /// On success the new access token is stored next to the unchanged
    /// refresh token and returned. On any failure the session ends: both
    /// tokens are cleared, the navigator is sent to the login route and
    /// `None` is returned. There is a single attempt.
    pub async fn refresh(&self) -> Option<String> {
        let Some(refresh_token) = self.credentials.get().refresh_token else {
            warn!("No refresh token stored, ending session");
            self.end_session();
            return None;
        };

        let access_token = match self.exchange_refresh_token(&refresh_token).await {
            Ok(access_token) => access_token,
            Err(err) => {
                error!("Unable to refresh access token: {err}");
                self.end_session();
                return None;
            }
        };

        if let Err(err) = self.credentials.save(&access_token, &refresh_token) {
            error!("Unable to store refreshed access token: {err}");
            self.end_session();
            return None;
        }

        info!("Access token refreshed");
        Some(access_token)
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<String, ClientError> {
        let request = self
            .client
            .post(resolve(&self.endpoints.api_url, REFRESH_PATH))
            .json(&RefreshRequest {
                refresh: refresh_token,
            });
        let response: RefreshResponse = self.execute(request).await?;
        Ok(response.access)
    }

    /// Wipe credentials and send the user to sign in again
    fn end_session(&self) {
        if let Err(err) = self.credentials.clear() {
            error!("Unable to clear stored credentials: {err}");
        }
        self.navigator.redirect(&self.endpoints.login_route);
    }
}
