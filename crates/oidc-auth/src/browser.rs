//! Redirect payloads and the browser hand-off continuation
//!
//! `authorize` and `logout` hand control to an external authorization
//! surface (system browser, custom tab). The hand-off is a two-outcome
//! continuation: the surface holds a [`FlowCompleter`] and fires exactly one
//! of complete/cancel; the caller awaits the [`BrowserFlow`]. The completer
//! is consumed by value, so double delivery is unrepresentable.

use tokio::sync::oneshot;

/// The redirect bundle delivered by the platform's authorization surface.
///
/// Carries either `{code, state}` on success or
/// `{error, error_description}` on failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectPayload {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl RedirectPayload {
    /// Whether the authorization surface reported a failure.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Outcome of a browser hand-off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// The surface delivered a redirect back to the app.
    Completed(RedirectPayload),
    /// The user aborted, or the surface went away without delivering.
    Cancelled,
}

/// Caller half of the hand-off: the URL to open plus the awaitable outcome.
pub struct BrowserFlow {
    url: String,
    outcome: oneshot::Receiver<FlowOutcome>,
}

impl BrowserFlow {
    /// The URL the external surface must open.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Wait for the surface to resolve the flow. A completer dropped
    /// without firing resolves as `Cancelled`.
    pub async fn outcome(self) -> FlowOutcome {
        self.outcome.await.unwrap_or(FlowOutcome::Cancelled)
    }
}

/// Surface half of the hand-off.
pub struct FlowCompleter {
    sender: oneshot::Sender<FlowOutcome>,
}

impl FlowCompleter {
    /// The redirect arrived.
    pub fn complete(self, payload: RedirectPayload) {
        let _ = self.sender.send(FlowOutcome::Completed(payload));
    }

    /// The user aborted.
    pub fn cancel(self) {
        let _ = self.sender.send(FlowOutcome::Cancelled);
    }
}

pub(crate) fn browser_flow(url: String) -> (BrowserFlow, FlowCompleter) {
    let (sender, outcome) = oneshot::channel();
    (BrowserFlow { url, outcome }, FlowCompleter { sender })
}
