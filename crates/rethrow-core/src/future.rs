// SPDX-License-Identifier: MIT OR Apache-2.0
//! The error-remapping future.

use std::error::Error;
use std::fmt;
use std::future::{Future, ready};
use std::pin::Pin;
use std::task::{Context, Poll};

use rethrow_error::{Failure, FromMessage};
use rethrow_shape::{TransformOptions, map_shape};
use schemars::JsonSchema;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::settler::{SettleError, Settler};
use crate::table::{RethrowRule, RethrowTable};

type BoxFuture<T> = Pin<Box<dyn Future<Output = Result<T, Failure>> + Send + 'static>>;

/// Whether failures are routed through the remap table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Direct,
    Intercepting,
}

/// A future whose failures can be remapped by exact error type.
///
/// Rules are declared with [`rethrow_as`](Self::rethrow_as) before the
/// future is awaited.  The first declaration installs the interception
/// stage; later ones only grow the table that stage consults when the
/// computation fails.
///
/// ```
/// use rethrow_core::RethrowFuture;
/// use rethrow_error::{PlainError, error_kinds};
///
/// error_kinds! {
///     struct NotFound;
///     struct Timeout;
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let err = RethrowFuture::<()>::rejected(NotFound::new("no such row"))
///     .rethrow_as::<NotFound, PlainError>()
///     .rethrow_as::<Timeout, PlainError>()
///     .await
///     .unwrap_err();
///
/// assert!(err.is::<PlainError>());
/// assert_eq!(err.message(), "no such row");
/// # });
/// ```
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct RethrowFuture<T> {
    inner: BoxFuture<T>,
    table: RethrowTable,
    stage: Stage,
}

impl<T: Send + 'static> RethrowFuture<T> {
    /// Wrap a computation that already fails with [`Failure`].
    pub fn new<F>(fut: F) -> Self
    where
        F: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        Self {
            inner: Box::pin(fut),
            table: RethrowTable::new(),
            stage: Stage::Direct,
        }
    }

    /// Wrap a computation failing with a concrete error type `E`.
    pub fn from_result_future<F, E>(fut: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        E: Error + Send + Sync + 'static,
    {
        Self::new(async move { fut.await.map_err(Failure::new) })
    }

    /// Run `producer` now, handing it the [`Settler`] for this future.
    ///
    /// The producer may settle synchronously or move the settler into a
    /// task and settle later.  Dropping the settler unsettled fails the
    /// future with [`SettleError::Abandoned`].
    pub fn with_producer<P>(producer: P) -> Self
    where
        P: FnOnce(Settler<T>),
    {
        let (settler, rx) = Settler::channel();
        producer(settler);
        Self::new(async move {
            match rx.await {
                Ok(result) => result,
                Err(_) => Err(Failure::new(SettleError::Abandoned)),
            }
        })
    }

    /// An already resolved future.
    pub fn resolved(value: T) -> Self {
        Self::new(ready(Ok(value)))
    }

    /// An already rejected future.
    pub fn rejected<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Self::new(ready(Err(Failure::new(error))))
    }

    /// Fail with a fresh `D` instead whenever this future fails with an `S`.
    ///
    /// Registering `S` again replaces its destination.
    pub fn rethrow_as<S, D>(self) -> Self
    where
        S: Error + 'static,
        D: FromMessage,
    {
        self.with_rule(RethrowRule::new::<S, D>())
    }

    /// Register a pre-built rule.
    pub fn with_rule(mut self, rule: RethrowRule) -> Self {
        trace!(
            target: "rethrow.future",
            source = %rule.source(),
            dest = %rule.dest(),
            "registering rethrow rule"
        );
        self.table.insert(rule);
        if self.stage == Stage::Direct {
            self.stage = Stage::Intercepting;
        }
        self
    }

    /// Attach success and failure continuations.
    ///
    /// This future's own interception runs first, so `on_err` sees the
    /// already remapped failure.  The derived future starts with a copy of
    /// this future's table but without an interception stage of its own:
    /// failures raised by the continuations are not remapped by rules
    /// registered upstream.  A `rethrow_as` on the derived future installs
    /// its stage, which then consults the copied rules too.  Rules added to
    /// it later do not reach back to this one.
    pub fn settle<U, OkF, OkFut, ErrF, ErrFut>(self, on_ok: OkF, on_err: ErrF) -> RethrowFuture<U>
    where
        U: Send + 'static,
        OkF: FnOnce(T) -> OkFut + Send + 'static,
        OkFut: Future<Output = Result<U, Failure>> + Send + 'static,
        ErrF: FnOnce(Failure) -> ErrFut + Send + 'static,
        ErrFut: Future<Output = Result<U, Failure>> + Send + 'static,
    {
        let table = self.table.clone();
        let inner = Box::pin(async move {
            match self.await {
                Ok(value) => on_ok(value).await,
                Err(failure) => on_err(failure).await,
            }
        });
        RethrowFuture {
            inner,
            table,
            stage: Stage::Direct,
        }
    }

    /// Transform the success value; failures pass through.
    pub fn map_ok<U, F>(self, f: F) -> RethrowFuture<U>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.settle(move |value| ready(Ok(f(value))), |failure| ready(Err(failure)))
    }

    /// Handle a failure; success passes through.
    pub fn catch<F, Fut>(self, on_err: F) -> RethrowFuture<T>
    where
        F: FnOnce(Failure) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, Failure>> + Send + 'static,
    {
        self.settle(|value| ready(Ok(value)), on_err)
    }

    /// Map the success value onto the shape `S`.
    ///
    /// `options` are layered over [`TransformOptions::defaults`], which drop
    /// every field `S` does not declare.  Failures pass through without the
    /// mapper being consulted; a value that does not fit `S` fails with a
    /// [`ShapeError`](rethrow_shape::ShapeError).
    pub fn transform<S>(self, options: TransformOptions) -> RethrowFuture<S>
    where
        T: Serialize,
        S: DeserializeOwned + JsonSchema + Send + 'static,
    {
        let options = TransformOptions::defaults().merge(options);
        self.settle(
            move |value| ready(map_shape::<S, T>(&value, &options).map_err(Failure::new)),
            |failure| ready(Err(failure)),
        )
    }
}

impl<T> RethrowFuture<T> {
    /// The rules registered so far.
    pub fn table(&self) -> &RethrowTable {
        &self.table
    }

    /// Returns `true` once a rule has been registered on this future itself.
    pub fn is_intercepting(&self) -> bool {
        self.stage == Stage::Intercepting
    }
}

impl<T> Future for RethrowFuture<T> {
    type Output = Result<T, Failure>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match this.inner.as_mut().poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(value)) => Poll::Ready(Ok(value)),
            Poll::Ready(Err(failure)) => Poll::Ready(Err(match this.stage {
                Stage::Direct => failure,
                Stage::Intercepting => this.table.classify(failure),
            })),
        }
    }
}

impl<T> fmt::Debug for RethrowFuture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RethrowFuture")
            .field("table", &self.table)
            .field("stage", &self.stage)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rethrow_error::{ErrorKind, PlainError, error_kinds};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    error_kinds! {
        struct X;
        struct Y;
        struct Z;
        struct E1;
        struct E2;
    }

    #[tokio::test]
    async fn success_flows_through() {
        let value = RethrowFuture::resolved(5)
            .rethrow_as::<X, E1>()
            .await
            .unwrap();
        assert_eq!(value, 5);
    }

    #[tokio::test]
    async fn no_rules_means_no_interception() {
        let fut = RethrowFuture::<()>::rejected(X::new("x"));
        assert!(!fut.is_intercepting());
        let err = fut.await.unwrap_err();
        assert!(err.is::<X>());
        assert_eq!(err.message(), "x");
    }

    #[tokio::test]
    async fn first_rule_installs_interception() {
        let fut = RethrowFuture::<()>::rejected(X::default());
        let fut = fut.rethrow_as::<Y, E1>();
        assert!(fut.is_intercepting());
        let fut = fut.rethrow_as::<Z, E2>();
        assert!(fut.is_intercepting());
        assert_eq!(fut.table().len(), 2);
    }

    #[tokio::test]
    async fn later_rules_are_seen_by_the_single_stage() {
        let err = RethrowFuture::<()>::rejected(Z::new("late"))
            .rethrow_as::<X, E1>()
            .rethrow_as::<Y, E1>()
            .rethrow_as::<Z, E2>()
            .await
            .unwrap_err();
        assert!(err.is::<E2>());
        assert_eq!(err.message(), "late");
    }

    #[tokio::test]
    async fn producer_can_settle_later() {
        let fut = RethrowFuture::<u8>::with_producer(|settler| {
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                settler.reject(X::new("later"));
            });
        })
        .rethrow_as::<X, PlainError>();
        let err = fut.await.unwrap_err();
        assert!(err.is::<PlainError>());
        assert_eq!(err.message(), "later");
    }

    #[tokio::test]
    async fn producer_resolves() {
        let value = RethrowFuture::with_producer(|settler| settler.resolve("ok"))
            .await
            .unwrap();
        assert_eq!(value, "ok");
    }

    #[tokio::test]
    async fn abandoned_settler_fails() {
        let err = RethrowFuture::<u8>::with_producer(drop).await.unwrap_err();
        assert!(err.is::<SettleError>());
        assert_eq!(
            err.downcast::<SettleError>().unwrap(),
            SettleError::Abandoned
        );
    }

    #[tokio::test]
    async fn abandoned_settler_can_be_remapped() {
        let err = RethrowFuture::<u8>::with_producer(drop)
            .rethrow_as::<SettleError, E1>()
            .await
            .unwrap_err();
        assert!(err.is::<E1>());
    }

    #[tokio::test]
    async fn from_result_future_captures_concrete_kind() {
        let err = RethrowFuture::<()>::from_result_future(async { Err(Y::new("y")) })
            .rethrow_as::<Y, E2>()
            .await
            .unwrap_err();
        assert!(err.is::<E2>());
        assert_eq!(err.origin(), Some(ErrorKind::of::<Y>()));
    }

    #[tokio::test]
    async fn settle_sees_remapped_failure() {
        let out = RethrowFuture::<u32>::rejected(X::new("x"))
            .rethrow_as::<X, E1>()
            .settle(
                |v| ready(Ok(v.to_string())),
                |f| ready(Ok(f.kind().short_name().to_string())),
            )
            .await
            .unwrap();
        assert_eq!(out, "E1");
    }

    #[tokio::test]
    async fn derived_future_copies_table() {
        let parent = RethrowFuture::resolved(1u8)
            .rethrow_as::<X, E1>()
            .rethrow_as::<Y, E2>();
        let derived = parent.map_ok(|v| v + 1);
        assert!(!derived.is_intercepting());
        assert_eq!(derived.table().len(), 2);
        assert_eq!(derived.await.unwrap(), 2);
    }

    #[tokio::test]
    async fn upstream_rules_skip_continuation_failures() {
        let err = RethrowFuture::resolved(1u8)
            .rethrow_as::<X, E1>()
            .settle(
                |_| ready(Err::<u8, _>(Failure::new(X::new("from continuation")))),
                |f| ready(Err(f)),
            )
            .await
            .unwrap_err();
        assert!(err.is::<X>());
        assert!(!err.is_remapped());
    }

    #[tokio::test]
    async fn parent_miss_passes_through_catch() {
        let err = RethrowFuture::<u8>::rejected(Z::new("z"))
            .rethrow_as::<X, E1>()
            .catch(|f| ready(Err(f)))
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Z>(), Some(&Z::new("z")));
    }

    #[tokio::test]
    async fn derived_rules_apply_to_continuation_failures() {
        let err = RethrowFuture::resolved(1u8)
            .rethrow_as::<X, E1>()
            .settle(
                |_| ready(Err::<u8, _>(Failure::new(Y::new("from continuation")))),
                |f| ready(Err(f)),
            )
            .rethrow_as::<Y, E2>()
            .await
            .unwrap_err();
        assert!(err.is::<E2>());
        assert_eq!(err.message(), "from continuation");
    }

    #[tokio::test]
    async fn replaced_failure_is_not_replaced_again_downstream() {
        let err = RethrowFuture::<u8>::rejected(X::new("x"))
            .rethrow_as::<X, Y>()
            .rethrow_as::<Y, Z>()
            .map_ok(|v| v)
            .await
            .unwrap_err();
        assert!(err.is::<Y>());
    }

    #[tokio::test]
    async fn catch_recovers_explicitly() {
        let value = RethrowFuture::<u8>::rejected(X::new("x"))
            .catch(|f| async move { if f.is::<X>() { Ok(0) } else { Err(f) } })
            .await
            .unwrap();
        assert_eq!(value, 0);
    }

    #[tokio::test]
    async fn map_ok_leaves_failure_alone() {
        let err = RethrowFuture::<u8>::rejected(Z::new("z"))
            .map_ok(|v| v * 2)
            .await
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Z>(), Some(&Z::new("z")));
    }

    // -- transform --------------------------------------------------------

    #[derive(Debug, Serialize)]
    struct Row {
        id: u32,
        name: String,
        password: String,
    }

    #[derive(Debug, PartialEq, Deserialize, JsonSchema)]
    #[serde(deny_unknown_fields)]
    struct PublicRow {
        id: u32,
        name: String,
    }

    static SERIALIZED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug)]
    struct Counted;

    impl Serialize for Counted {
        fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            SERIALIZED.fetch_add(1, Ordering::SeqCst);
            serializer.serialize_unit()
        }
    }

    fn row() -> Row {
        Row {
            id: 3,
            name: "ada".into(),
            password: "secret".into(),
        }
    }

    #[tokio::test]
    async fn transform_drops_undeclared_fields() {
        let out: PublicRow = RethrowFuture::resolved(row())
            .transform(TransformOptions::new())
            .await
            .unwrap();
        assert_eq!(
            out,
            PublicRow {
                id: 3,
                name: "ada".into()
            }
        );
    }

    #[tokio::test]
    async fn transform_options_override_defaults() {
        let err = RethrowFuture::resolved(row())
            .transform::<PublicRow>(TransformOptions::new().exclude_extraneous_values(false))
            .await
            .unwrap_err();
        assert!(err.is::<rethrow_shape::ShapeError>());
    }

    #[tokio::test]
    async fn transform_keeps_rules() {
        let fut = RethrowFuture::<Row>::rejected(X::new("x"))
            .rethrow_as::<X, E1>()
            .transform::<PublicRow>(TransformOptions::new());
        assert_eq!(fut.table().len(), 1);
        let err = fut.await.unwrap_err();
        assert!(err.is::<E1>());
    }

    #[tokio::test]
    async fn transform_never_maps_a_failure() {
        let before = SERIALIZED.load(Ordering::SeqCst);
        let err = RethrowFuture::<Counted>::rejected(Z::new("z"))
            .transform::<()>(TransformOptions::new())
            .await
            .unwrap_err();
        assert!(err.is::<Z>());
        assert_eq!(SERIALIZED.load(Ordering::SeqCst), before);
    }

    #[test]
    fn debug_shows_stage() {
        let fut = RethrowFuture::resolved(()).rethrow_as::<X, E1>();
        let dbg = format!("{fut:?}");
        assert!(dbg.contains("Intercepting"));
    }
}
