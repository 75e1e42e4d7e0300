use tracing::{debug, info};

use super::{check_status, decode_json, error_message, MilibroClient};
use crate::{
    error::{Error, Result},
    traits::Names,
    types::user::{LoginRequest, Session, User},
};

impl MilibroClient {
    /// `POST /auth/login`. On success the token is kept for later requests.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.endpoint("/auth/login");
        debug!(url = %url, email = %email, "logging in");

        let response = self
            .http
            .post(&url)
            .json(&LoginRequest {
                email:    email.trim().to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        let status = response.status().as_u16();
        if matches!(status, 400 | 401 | 403 | 404) {
            let message = match error_message(response).await {
                m if m.trim().is_empty() => "Invalid email or password".to_string(),
                m => m,
            };
            return Err(Error::AuthFailed(message));
        }
        let response = check_status(response, User::NAME_SINGULAR, email).await?;
        let session: Session = decode_json(response, "login response").await?;

        self.set_token(Some(session.access_token.clone())).await;
        info!(user = %session.user.id, "logged in");
        Ok(session)
    }

    /// Forgets the token. The backend keeps no server-side session.
    pub async fn logout(&self) {
        self.set_token(None).await;
        info!("logged out");
    }
}
