use std::future::Future;
use std::sync::Arc;

use crate::{AccessError, AuthCheck, AuthContext};

/// How a [Checker] combines its checks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CombineMode {
    /// The first check to grant wins; denies only if every check denies
    #[default]
    Any,
    /// The first check to deny wins, stopping early; grants only if every
    /// check grants
    All,
}

/// An ordered list of [AuthCheck]s plus a [CombineMode].
///
/// Under [CombineMode::Any] the terminal error of a total denial is the
/// *first* check's error: the first check is the route's primary rule, and
/// later entries are escape hatches (most commonly [crate::SuperOnly]) whose
/// failures are not informative. Under [CombineMode::All] evaluation stops
/// at the first denial and that denial is terminal.
///
/// ```ignore
/// // Admins, or the superuser, may list accounts.
/// let checker = Checker::any()
///     .check(HasRole::new("admin"))
///     .check(SuperOnly);
/// checker.then(cx, |cx| list_accounts(cx)).await
/// ```
#[derive(Clone, Default)]
pub struct Checker {
    checks: Vec<Arc<dyn AuthCheck>>,
    mode: CombineMode,
}

impl Checker {
    /// A checker that grants if any of its checks grants
    pub fn any() -> Self {
        Self {
            checks: Vec::new(),
            mode: CombineMode::Any,
        }
    }

    /// A checker that grants only if all of its checks grant
    pub fn all() -> Self {
        Self {
            checks: Vec::new(),
            mode: CombineMode::All,
        }
    }

    /// Append a check; order is significant
    pub fn check(mut self, check: impl AuthCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    /// Evaluate the configured checks against `cx`
    pub async fn evaluate(&self, cx: &AuthContext) -> Result<(), AccessError> {
        match self.mode {
            CombineMode::Any => {
                let mut terminal = None;
                for check in &self.checks {
                    match check.check(cx).await {
                        Ok(()) => return Ok(()),
                        Err(error) => {
                            terminal.get_or_insert(error);
                        }
                    }
                }
                // An empty ANY checker has nothing that could grant.
                Err(terminal.unwrap_or(AccessError::Forbidden))
            }
            CombineMode::All => {
                for check in &self.checks {
                    check.check(cx).await?;
                }
                Ok(())
            }
        }
    }

    /// Gate `handler` behind this checker.
    ///
    /// Evaluates the checks and either awaits the downstream handler with
    /// the context, or yields the terminal [AccessError] for the transport
    /// layer to render — always the actual failing check's error, never a
    /// blanket refusal.
    pub async fn then<Handler, Fut, Out>(
        &self,
        cx: AuthContext,
        handler: Handler,
    ) -> Result<Out, AccessError>
    where
        Handler: FnOnce(AuthContext) -> Fut,
        Fut: Future<Output = Out>,
    {
        match self.evaluate(&cx).await {
            Ok(()) => {
                tracing::info!(subject = %cx.subject_label(), "access granted");
                Ok(handler(cx).await)
            }
            Err(error) => {
                tracing::warn!(subject = %cx.subject_label(), %error, "access denied");
                Err(error)
            }
        }
    }
}
