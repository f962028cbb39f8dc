// ── Session manager ──
//
// Sole owner of the router session. Every request goes through
// `SessionManager::call`, which acquires a session, runs the request and
// transparently re-authenticates once when the router reports the session
// expired.
//
// Login is single-flight: the first caller that finds no usable session
// starts a login future and parks it in the state as a `Shared` future;
// concurrent callers clone and await that same future, so N simultaneous
// acquires cost exactly one login. The state lock is a plain std mutex
// held only for bookkeeping, never across an await.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use peplink_api::{PeplinkClient, Session};

use crate::config::{AuthCredentials, DEFAULT_TOKEN_LIFETIME, LoginPolicy};
use crate::error::CoreError;

type LoginFlight = Shared<BoxFuture<'static, Result<Lease, CoreError>>>;

/// A session handle tagged with the login that produced it.
#[derive(Debug, Clone)]
pub struct Lease {
    session: Session,
    generation: u64,
    expires_at: Option<Instant>,
}

impl Lease {
    pub fn session(&self) -> &Session {
        &self.session
    }

    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

enum SessionState {
    Idle,
    Ready(Lease),
    Refreshing { generation: u64, flight: LoginFlight },
    Rejected { at: Instant, error: CoreError },
}

/// Authentication state as seen by health evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// No session yet, or the last one was invalidated.
    Idle,
    Authenticated,
    Authenticating,
    /// Credentials were rejected; not retried until the cooldown passes.
    Rejected,
}

pub struct SessionManager {
    api: PeplinkClient,
    credentials: AuthCredentials,
    policy: LoginPolicy,
    state: Mutex<SessionState>,
    next_generation: AtomicU64,
    logins: Arc<AtomicU64>,
}

impl SessionManager {
    pub fn new(api: PeplinkClient, credentials: AuthCredentials, policy: LoginPolicy) -> Self {
        Self {
            api,
            credentials,
            policy,
            state: Mutex::new(SessionState::Idle),
            next_generation: AtomicU64::new(1),
            logins: Arc::new(AtomicU64::new(0)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Login requests issued so far, retries included.
    pub fn login_count(&self) -> u64 {
        self.logins.load(Ordering::Relaxed)
    }

    pub fn auth_state(&self) -> AuthState {
        match &*self.lock() {
            SessionState::Idle => AuthState::Idle,
            SessionState::Ready(_) => AuthState::Authenticated,
            SessionState::Refreshing { .. } => AuthState::Authenticating,
            SessionState::Rejected { .. } => AuthState::Rejected,
        }
    }

    /// Return a usable session, logging in first if needed.
    ///
    /// Concurrent callers share one in-flight login and all receive its
    /// outcome. After rejected credentials, callers fail fast with the
    /// same error until `LoginPolicy::rejected_cooldown` has passed.
    pub async fn acquire(&self) -> Result<Lease, CoreError> {
        let (generation, flight) = {
            let mut state = self.lock();
            let now = Instant::now();
            match &*state {
                SessionState::Ready(lease) if !lease.is_expired(now) => return Ok(lease.clone()),
                SessionState::Rejected { at, error }
                    if now.duration_since(*at) < self.policy.rejected_cooldown =>
                {
                    return Err(error.clone());
                }
                SessionState::Refreshing { generation, flight } => (*generation, flight.clone()),
                _ => {
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let flight = self.start_login(generation);
                    *state = SessionState::Refreshing {
                        generation,
                        flight: flight.clone(),
                    };
                    (generation, flight)
                }
            }
        };

        let result = flight.await;
        self.settle(generation, &result);
        result
    }

    /// Drop `lease` if it is still the current session.
    ///
    /// A stale lease (one a concurrent caller already replaced) is
    /// ignored, so a burst of 401s triggers a single re-login.
    pub fn invalidate(&self, lease: &Lease) {
        let mut state = self.lock();
        if matches!(&*state, SessionState::Ready(current) if current.generation == lease.generation)
        {
            debug!(generation = lease.generation, "session invalidated");
            *state = SessionState::Idle;
        }
    }

    /// Run `op` with a session. A session-expired response invalidates the
    /// session, logs in once more and retries `op` once; a second expiry
    /// is reported as [`CoreError::SessionExpired`].
    pub async fn call<T, F, Fut>(&self, op: F) -> Result<T, CoreError>
    where
        F: Fn(Session) -> Fut,
        Fut: Future<Output = Result<T, peplink_api::Error>>,
    {
        let lease = self.acquire().await?;
        match op(lease.session.clone()).await {
            Err(e) if e.is_auth_expired() => {
                debug!("session expired, re-authenticating");
                self.invalidate(&lease);
                let lease = self.acquire().await?;
                match op(lease.session.clone()).await {
                    Err(e) if e.is_auth_expired() => {
                        warn!("session expired again right after re-authentication");
                        self.invalidate(&lease);
                        Err(CoreError::SessionExpired)
                    }
                    other => other.map_err(CoreError::from),
                }
            }
            other => other.map_err(CoreError::from),
        }
    }

    /// Record a finished login. Only the flight that is still current may
    /// change the state; the first waiter to get here applies it.
    fn settle(&self, generation: u64, result: &Result<Lease, CoreError>) {
        let mut state = self.lock();
        let current = matches!(
            &*state,
            SessionState::Refreshing { generation: g, .. } if *g == generation
        );
        if !current {
            return;
        }
        *state = match result {
            Ok(lease) => SessionState::Ready(lease.clone()),
            Err(error @ CoreError::AuthenticationFailed { .. }) => {
                warn!(error = %error, "router rejected credentials");
                SessionState::Rejected {
                    at: Instant::now(),
                    error: error.clone(),
                }
            }
            Err(_) => SessionState::Idle,
        };
    }

    fn start_login(&self, generation: u64) -> LoginFlight {
        let api = self.api.clone();
        let credentials = self.credentials.clone();
        let policy = self.policy;
        let logins = Arc::clone(&self.logins);

        async move {
            let mut delay = policy.backoff;
            let mut attempt = 0;
            loop {
                logins.fetch_add(1, Ordering::Relaxed);
                match login_once(&api, &credentials).await {
                    Ok((session, expires_at)) => {
                        info!(generation, "authenticated with router");
                        return Ok(Lease {
                            session,
                            generation,
                            expires_at,
                        });
                    }
                    Err(e) if e.is_transient() && attempt < policy.retries => {
                        attempt += 1;
                        warn!(error = %e, attempt, "login failed, retrying");
                        tokio::time::sleep(delay).await;
                        delay = delay.saturating_mul(2);
                    }
                    Err(e) => return Err(CoreError::from(e)),
                }
            }
        }
        .boxed()
        .shared()
    }
}

async fn login_once(
    api: &PeplinkClient,
    credentials: &AuthCredentials,
) -> Result<(Session, Option<Instant>), peplink_api::Error> {
    match credentials {
        AuthCredentials::UserPass { username, password } => {
            Ok((api.login(username, password).await?, None))
        }
        AuthCredentials::Token {
            client_id,
            client_secret,
        } => {
            let grant = api.grant_token(client_id, client_secret).await?;
            let now = Instant::now();
            // `expiresIn` comes from the router; an out-of-range value
            // falls back to the default lifetime.
            let expires_at = grant
                .expires_in
                .and_then(|lifetime| now.checked_add(lifetime))
                .or_else(|| now.checked_add(DEFAULT_TOKEN_LIFETIME));
            Ok((grant.session, expires_at))
        }
    }
}
