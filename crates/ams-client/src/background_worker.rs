use std::sync::{Arc, Weak};

use tokio::time::MissedTickBehavior;

use crate::ClientState;

pub(crate) fn spawn_background_worker(
    state: &Arc<ClientState>,
    closed_rx: tokio::sync::watch::Receiver<()>,
) {
    // The worker must not keep the state alive; a weak reference lets the
    // task end when the last client handle is dropped.
    tokio::spawn(background_worker(Arc::downgrade(state), closed_rx));
}

async fn background_worker(
    state: Weak<ClientState>,
    mut closed_rx: tokio::sync::watch::Receiver<()>,
) {
    let period = match state.upgrade() {
        Some(state) => state.refresh_interval,
        None => return,
    };

    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let Some(state) = state.upgrade() else { return };
                refresh_tick(&state).await;
            }
            _ = closed_rx.changed() => {
                tracing::debug!("session closed, stopping token refresh");
                return;
            }
        }
    }
}

/// Silent token refresh.
///
/// Success only moves the stored token; the published user is untouched.
/// Failure falls back to a full session check, which may end the session.
async fn refresh_tick(state: &ClientState) {
    if !state.session.load().is_authenticated() {
        return;
    }

    match state.gateway.refresh_token().await {
        Ok(access) => {
            state.store.set(&access);
        }
        Err(err) => {
            tracing::warn!(?err, "token refresh failed, revalidating session");
            let _ = state.check_auth_status().await;
        }
    }
}
