//! Refresh-and-retry policy for rejected credentials
//!
//! Per request:
//!
//! - sent, response arrives: anything other than a 401 on a request that
//!   carried a credential and has not been retried is final.
//! - otherwise refresh: exchange the refresh credential for a new access
//!   credential, store it, and send the request once more with it. The second
//!   response is final whatever it is.
//! - refresh failed: clear the session, force navigation to the login entry
//!   point and hand the refresh error to the caller.
//!
//! Refreshes are serialized. A request that waited behind another refresh
//! checks whether the stored credential already changed and, if so, retries
//! with it instead of refreshing again, so parallel 401s share one refresh.

use super::{ApiClient, ApiRequest, ClientError, Origin, decode_body};
use crate::types::{TokenRefreshRequest, TokenRefreshResponse};
use bytes::Bytes;
use tracing::{debug, info, warn};

/// How many times a request has been sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    /// First send
    Initial,
    /// Replay after a refresh; never refreshed again
    Retried,
}

/// A request paired with its attempt marker
#[derive(Debug, Clone)]
pub struct PendingRequest {
    request: ApiRequest,
    attempt: Attempt,
}

impl PendingRequest {
    pub fn new(request: ApiRequest) -> Self {
        Self {
            request,
            attempt: Attempt::Initial,
        }
    }

    /// The same request, marked as replayed
    #[must_use]
    pub fn retried(self) -> Self {
        Self {
            request: self.request,
            attempt: Attempt::Retried,
        }
    }

    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    pub fn attempt(&self) -> Attempt {
        self.attempt
    }
}

impl ApiClient {
    /// Send a request, recovering once from a rejected credential
    pub(crate) async fn dispatch(&self, pending: PendingRequest) -> Result<Bytes, ClientError> {
        let credential = if pending.request().is_authenticated() {
            self.session.get()
        } else {
            None
        };

        let error = match self.send(&pending, credential.as_deref()).await {
            Ok(body) => return Ok(body),
            Err(error) => error,
        };

        // Requests sent without a credential have nothing to refresh
        let Some(rejected) = credential else {
            return Err(error);
        };
        if !error.is_unauthorized() || pending.attempt() == Attempt::Retried {
            return Err(error);
        }

        info!(
            path = pending.request().path(),
            "Credential rejected, attempting refresh"
        );
        let fresh = self.refresh_session(Some(&rejected)).await?;
        self.send(&pending.retried(), Some(&fresh)).await
    }

    /// Obtain a new access credential, serialized against concurrent callers.
    ///
    /// `rejected` is the credential the backend just refused. If the store no
    /// longer holds it once the lock is acquired, another request already
    /// refreshed and the current credential is returned as-is.
    pub(crate) async fn refresh_session(&self, rejected: Option<&str>) -> Result<String, ClientError> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(rejected) = rejected {
            match self.session.get() {
                Some(current) if current != rejected => {
                    debug!("Credential already refreshed by a concurrent request");
                    return Ok(current);
                }
                None => {
                    debug!("Session ended while waiting for a concurrent refresh");
                    return Err(ClientError::SessionExpired);
                }
                Some(_) => {}
            }
        }

        match self.request_refresh().await {
            Ok(access) => {
                info!("Credential refreshed");
                Ok(access)
            }
            Err(error) => {
                warn!("Refresh failed, ending session: {error}");
                self.end_session();
                Err(error)
            }
        }
    }

    /// The refresh call itself: anonymous, never intercepted
    async fn request_refresh(&self) -> Result<String, ClientError> {
        let refresh = self
            .session
            .refresh_credential()
            .ok_or(ClientError::SessionExpired)?;

        let request = ApiRequest::post(Origin::App, self.refresh_path.clone())
            .anonymous()
            .json(&TokenRefreshRequest { refresh })?;
        let body = self
            .send(&PendingRequest::new(request).retried(), None)
            .await?;
        let response: TokenRefreshResponse = decode_body(&body)?;

        self.session.set(response.access.clone());
        if let Some(refresh) = response.refresh {
            self.session.set_refresh(refresh);
        }
        Ok(response.access)
    }

    /// Forget the credentials and send the user to the login entry point
    pub(crate) fn end_session(&self) {
        self.session.clear();
        self.navigator.navigate(&self.login_path);
    }
}
