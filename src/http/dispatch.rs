//! Generic dispatcher: plain business functions as HTTP handlers.
//!
//! # Responsibilities
//! - Bind a function to a fixed argument tuple at route registration
//! - Call it per request, sync or async
//! - Turn its return value into the success / failure envelope
//! - Recover panics into a 500 envelope instead of losing the connection
//!
//! # Design Decisions
//! - Arity is checked by the type system: the bound tuple must match the
//!   function's parameter list, and a function returning `()` has no
//!   [`Outcome`], so both wiring mistakes fail to compile
//! - `Result<T, E>` plays the role of "last return value is an error"
//! - This module is the only place that knows the envelope convention

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};

use axum::extract::Request;
use axum::handler::Handler;
use axum::http::{StatusCode, Uri};
use axum::response::Response;
use axum::Json;
use futures_util::future::{BoxFuture, FutureExt};
use serde::Serialize;

use crate::http::response::{respond_failure, respond_success};

/// Return values the dispatcher knows how to write.
pub trait Outcome {
    /// Render as the response to a request for `uri`.
    fn into_outcome(self, uri: &Uri) -> Response;
}

impl<T, E> Outcome for Result<T, E>
where
    T: Serialize,
    E: std::fmt::Display,
{
    fn into_outcome(self, uri: &Uri) -> Response {
        match self {
            Ok(value) => respond_success(value),
            Err(err) => respond_failure(uri, Some(StatusCode::INTERNAL_SERVER_ERROR), Some(&err)),
        }
    }
}

impl<T: Serialize> Outcome for Json<T> {
    fn into_outcome(self, _uri: &Uri) -> Response {
        respond_success(self.0)
    }
}

impl<T: Serialize> Outcome for Vec<T> {
    fn into_outcome(self, _uri: &Uri) -> Response {
        respond_success(self)
    }
}

macro_rules! impl_plain_outcome {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Outcome for $ty {
                fn into_outcome(self, _uri: &Uri) -> Response {
                    respond_success(self)
                }
            }
        )*
    };
}

impl_plain_outcome!(
    String,
    &'static str,
    serde_json::Value,
    bool,
    i32,
    i64,
    u32,
    u64,
    usize,
    f64,
);

/// A synchronous business function callable with `Args`.
pub trait BusinessFn<Args>: Clone + Send + Sync + 'static {
    type Output: Outcome;

    fn invoke(&self, args: Args) -> Self::Output;
}

/// An async business function callable with `Args`.
pub trait AsyncBusinessFn<Args>: Clone + Send + Sync + 'static {
    type Output: Outcome;
    type Future: Future<Output = Self::Output> + Send + 'static;

    fn invoke(&self, args: Args) -> Self::Future;
}

macro_rules! impl_business_fn {
    ($($ty:ident),*) => {
        #[allow(non_snake_case)]
        impl<F, R, $($ty,)*> BusinessFn<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Clone + Send + Sync + 'static,
            R: Outcome,
        {
            type Output = R;

            fn invoke(&self, args: ($($ty,)*)) -> R {
                let ($($ty,)*) = args;
                self($($ty),*)
            }
        }

        #[allow(non_snake_case)]
        impl<F, Fut, $($ty,)*> AsyncBusinessFn<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Clone + Send + Sync + 'static,
            Fut: Future + Send + 'static,
            Fut::Output: Outcome,
        {
            type Output = Fut::Output;
            type Future = Fut;

            fn invoke(&self, args: ($($ty,)*)) -> Fut {
                let ($($ty,)*) = args;
                self($($ty),*)
            }
        }
    };
}

impl_business_fn!();
impl_business_fn!(A1);
impl_business_fn!(A1, A2);
impl_business_fn!(A1, A2, A3);
impl_business_fn!(A1, A2, A3, A4);
impl_business_fn!(A1, A2, A3, A4, A5);
impl_business_fn!(A1, A2, A3, A4, A5, A6);
impl_business_fn!(A1, A2, A3, A4, A5, A6, A7);
impl_business_fn!(A1, A2, A3, A4, A5, A6, A7, A8);

/// Handler produced by [`dispatch`].
#[derive(Clone)]
pub struct Dispatch<F, Args> {
    func: F,
    args: Args,
}

/// Handler produced by [`dispatch_async`].
#[derive(Clone)]
pub struct AsyncDispatch<F, Args> {
    func: F,
    args: Args,
}

/// Wrap `func` with its arguments bound up front.
///
/// ```
/// use axum::{routing::get, Router};
/// use chat_gateway::http::dispatch::dispatch;
///
/// fn greet(name: String) -> Result<String, std::io::Error> {
///     Ok(format!("hello {name}"))
/// }
///
/// let app: Router = Router::new().route("/greet", get(dispatch(greet, ("world".to_string(),))));
/// ```
///
/// Binding the wrong number of arguments is rejected when the routes are built:
///
/// ```compile_fail
/// use chat_gateway::http::dispatch::dispatch;
///
/// let _ = dispatch(|n: i32| n.to_string(), (1, 2));
/// ```
///
/// So is a function with nothing to return:
///
/// ```compile_fail
/// use chat_gateway::http::dispatch::dispatch;
///
/// let _ = dispatch(|| {}, ());
/// ```
pub fn dispatch<F, Args>(func: F, args: Args) -> Dispatch<F, Args>
where
    F: BusinessFn<Args>,
    Args: Clone + Send + Sync + 'static,
{
    Dispatch { func, args }
}

/// Like [`dispatch`] for functions returning a future.
pub fn dispatch_async<F, Args>(func: F, args: Args) -> AsyncDispatch<F, Args>
where
    F: AsyncBusinessFn<Args>,
    Args: Clone + Send + Sync + 'static,
{
    AsyncDispatch { func, args }
}

impl<F, Args, S> Handler<Args, S> for Dispatch<F, Args>
where
    F: BusinessFn<Args>,
    Args: Clone + Send + Sync + 'static,
{
    type Future = BoxFuture<'static, Response>;

    fn call(self, req: Request, _state: S) -> Self::Future {
        let uri = req.uri().clone();
        let Dispatch { func, args } = self;
        Box::pin(async move {
            match panic::catch_unwind(AssertUnwindSafe(|| func.invoke(args))) {
                Ok(outcome) => outcome.into_outcome(&uri),
                Err(payload) => recovered(&uri, payload.as_ref()),
            }
        })
    }
}

impl<F, Args, S> Handler<Args, S> for AsyncDispatch<F, Args>
where
    F: AsyncBusinessFn<Args>,
    Args: Clone + Send + Sync + 'static,
{
    type Future = BoxFuture<'static, Response>;

    fn call(self, req: Request, _state: S) -> Self::Future {
        let uri = req.uri().clone();
        let AsyncDispatch { func, args } = self;
        Box::pin(async move {
            let fut = match panic::catch_unwind(AssertUnwindSafe(|| func.invoke(args))) {
                Ok(fut) => fut,
                Err(payload) => return recovered(&uri, payload.as_ref()),
            };
            match AssertUnwindSafe(fut).catch_unwind().await {
                Ok(outcome) => outcome.into_outcome(&uri),
                Err(payload) => recovered(&uri, payload.as_ref()),
            }
        })
    }
}

fn recovered(uri: &Uri, payload: &(dyn Any + Send)) -> Response {
    let msg = panic_message(payload);
    tracing::warn!("panic: {}", msg);
    respond_failure(uri, Some(StatusCode::INTERNAL_SERVER_ERROR), Some(&msg))
}

/// Text of a panic payload, as far as it can be recovered.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Debug)]
    struct AnError;

    impl std::fmt::Display for AnError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "assert.AnError general error for testing")
        }
    }

    async fn hit(router: Router) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn error_result_becomes_failure_envelope() {
        fn failing() -> Result<String, AnError> {
            Err(AnError)
        }
        let router = Router::new().route("/", get(dispatch(failing, ())));

        let (status, body) = hit(router).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"msg":"assert.AnError general error for testing"}"#);
    }

    #[tokio::test]
    async fn panic_becomes_failure_envelope() {
        fn exploding() -> Result<String, AnError> {
            panic!("boom")
        }
        let router = Router::new().route("/", get(dispatch(exploding, ())));

        let (status, body) = hit(router.clone()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"msg":"boom"}"#);

        // the router keeps serving after a recovered panic
        let (status, _) = hit(router).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn formatted_panic_message_is_kept() {
        let router = Router::new().route(
            "/",
            get(dispatch(
                |n: u32| -> String { panic!("bad input {n}") },
                (7u32,),
            )),
        );

        let (_, body) = hit(router).await;
        assert_eq!(body, r#"{"msg":"bad input 7"}"#);
    }

    #[tokio::test]
    async fn single_value_is_success_payload() {
        let router = Router::new().route("/", get(dispatch(|| "some msg", ())));

        let (status, body) = hit(router).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#""some msg""#);
    }

    #[tokio::test]
    async fn ok_result_is_success_payload() {
        fn succeeding() -> Result<String, AnError> {
            Ok("x".to_string())
        }
        let router = Router::new().route("/", get(dispatch(succeeding, ())));

        let (status, body) = hit(router).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#""x""#);
    }

    #[tokio::test]
    async fn bound_arguments_are_passed_each_request() {
        let calls = Arc::new(AtomicUsize::new(0));
        let add = |a: i64, b: i64, calls: Arc<AtomicUsize>| {
            calls.fetch_add(1, Ordering::SeqCst);
            a + b
        };
        let router = Router::new().route("/", get(dispatch(add, (2i64, 40i64, calls.clone()))));

        for _ in 0..3 {
            let (status, body) = hit(router.clone()).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "42");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn struct_payload_through_json() {
        #[derive(Serialize)]
        struct Reply {
            answer: u8,
        }
        let router = Router::new().route("/", get(dispatch(|| Json(Reply { answer: 42 }), ())));

        let (_, body) = hit(router).await;
        assert_eq!(body, r#"{"answer":42}"#);
    }

    #[tokio::test]
    async fn async_function_success_and_error() {
        async fn lookup(key: &'static str) -> Result<String, AnError> {
            tokio::task::yield_now().await;
            if key == "known" {
                Ok("value".into())
            } else {
                Err(AnError)
            }
        }
        let router = Router::new()
            .route("/", get(dispatch_async(lookup, ("known",))))
            .route("/missing", get(dispatch_async(lookup, ("other",))));

        let (status, body) = hit(router.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#""value""#);

        let response = router
            .oneshot(Request::builder().uri("/missing").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn async_panic_while_polling_is_recovered() {
        async fn exploding() -> Result<String, AnError> {
            tokio::task::yield_now().await;
            panic!("boom")
        }
        let router = Router::new().route("/", get(dispatch_async(exploding, ())));

        let (status, body) = hit(router).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"msg":"boom"}"#);
    }

    #[test]
    fn panic_message_falls_back_for_opaque_payloads() {
        let payload: Box<dyn Any + Send> = Box::new(17u8);
        assert_eq!(panic_message(payload.as_ref()), "panic with non-string payload");
    }
}
