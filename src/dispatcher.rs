//! Channel-based dispatch of matched requests to handler-chain coroutines.
//!
//! Each registered route owns one coroutine consuming a channel of
//! invocations. A handler chain runs inside that coroutine with panic
//! recovery; the reply travels back over a per-request channel as an
//! [`EnvelopeReply`].

use may::coroutine;
use may::sync::mpsc;
use serde_json::Value;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::envelope::{EnvelopeReply, Responder, ResponseEnvelope};
use crate::validator::ValidatorCache;
use http::Method;

/// Maximum inline path parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Maximum inline headers/cookies before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Stack-allocated path parameter storage. Names are `Arc<str>` because the
/// same parameter names repeat on every match of a route.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Stack-allocated header/cookie storage
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Parsed request data handed to every handler in a chain.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    /// HTTP method (GET, POST, ...)
    pub method: Method,
    /// Request path as received, query string stripped
    pub path: String,
    /// Path parameters extracted by the route matcher
    pub path_params: ParamVec,
    /// Query string parameters, last occurrence wins
    pub query_params: HashMap<String, String>,
    /// HTTP headers
    pub headers: HeaderVec,
    /// Cookies parsed from the Cookie header
    pub cookies: HeaderVec,
    /// Request body parsed as JSON (if present)
    pub body: Option<Value>,
}

impl RouteRequest {
    /// Get a path parameter by name. Last write wins for duplicate names.
    #[inline]
    #[must_use]
    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name
    #[inline]
    #[must_use]
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(String::as_str)
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get a cookie by name
    #[inline]
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }
}

/// What a handler wants to happen after it returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerFlow {
    /// Continue with the next handler in the chain
    Next,
    /// Stop the chain; the response (if any) has been sent
    Done,
}

/// One step of a route's handler chain.
///
/// Handlers receive the parsed request, the shared application context and
/// the single-use responder. Returning `Err` aborts the chain with a 500.
pub trait RouteHandler<C>: Send + Sync {
    fn handle(
        &self,
        request: &RouteRequest,
        context: &C,
        responder: &mut Responder,
    ) -> anyhow::Result<HandlerFlow>;
}

impl<C, F> RouteHandler<C> for F
where
    F: Fn(&RouteRequest, &C, &mut Responder) -> anyhow::Result<HandlerFlow> + Send + Sync,
{
    fn handle(
        &self,
        request: &RouteRequest,
        context: &C,
        responder: &mut Responder,
    ) -> anyhow::Result<HandlerFlow> {
        self(request, context, responder)
    }
}

/// One queued request plus its reply channel.
struct RouteInvocation {
    request: RouteRequest,
    reply_tx: mpsc::Sender<EnvelopeReply>,
}

/// Type alias for a channel sender that feeds a route coroutine
type RouteSender = mpsc::Sender<RouteInvocation>;

fn internal_error_body(message: &str) -> Value {
    match serde_json::to_value(ResponseEnvelope::<Value>::failure(message, Vec::new())) {
        Ok(body) => body,
        Err(_) => serde_json::json!({ "error": message }),
    }
}

fn run_chain<C>(
    handlers: &[Arc<dyn RouteHandler<C>>],
    request: &RouteRequest,
    context: &C,
    responder: &mut Responder,
) -> anyhow::Result<()> {
    for handler in handlers {
        match handler.handle(request, context, responder)? {
            HandlerFlow::Next => continue,
            HandlerFlow::Done => return Ok(()),
        }
    }
    Ok(())
}

/// Routes invocations to registered route coroutines by route key.
#[derive(Clone, Default)]
pub struct Dispatcher {
    handlers: HashMap<String, RouteSender>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered routes
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Spawn a coroutine running `handlers` for every invocation of
    /// `route_key`, replacing any previous registration for the key.
    ///
    /// # Safety
    ///
    /// Calls `may::coroutine::Builder::spawn()`, which is unsafe in the `may`
    /// runtime. The caller must ensure the runtime is initialized before
    /// requests arrive.
    pub unsafe fn register_route<C: Send + Sync + 'static>(
        &mut self,
        route_key: &str,
        handlers: Vec<Arc<dyn RouteHandler<C>>>,
        context: Arc<C>,
        cache: ValidatorCache,
        stack_size: usize,
    ) -> anyhow::Result<()> {
        let (tx, rx) = mpsc::channel::<RouteInvocation>();
        let route_key = route_key.to_string();
        let key_for_coroutine = route_key.clone();

        if self.handlers.remove(&route_key).is_some() {
            warn!(route = %route_key, "Replaced existing route - old coroutine will exit");
        }

        // SAFETY: spawn is unsafe because of the may runtime's stack
        // requirements. The closure owns everything it touches and replies
        // only over the invocation's channel.
        let spawn_result = unsafe {
            coroutine::Builder::new()
                .stack_size(stack_size)
                .spawn(move || {
                    debug!(route = %key_for_coroutine, stack_size = stack_size, "Route coroutine start");

                    for invocation in rx.iter() {
                        let mut responder = Responder::new(
                            invocation.reply_tx,
                            cache.clone(),
                            key_for_coroutine.clone(),
                        );

                        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
                            run_chain(
                                &handlers,
                                &invocation.request,
                                context.as_ref(),
                                &mut responder,
                            )
                        }));

                        match outcome {
                            Ok(Ok(())) => {
                                if !responder.is_sent() {
                                    error!(
                                        route = %key_for_coroutine,
                                        "Handler chain finished without sending a response"
                                    );
                                    responder
                                        .send(500, internal_error_body("Internal server error"));
                                }
                            }
                            Ok(Err(handler_error)) => {
                                error!(
                                    route = %key_for_coroutine,
                                    error = %handler_error,
                                    "Handler returned an error"
                                );
                                if !responder.is_sent() {
                                    responder
                                        .send(500, internal_error_body("Internal server error"));
                                }
                            }
                            Err(panic) => {
                                error!(
                                    route = %key_for_coroutine,
                                    panic = ?panic,
                                    "Handler panicked"
                                );
                                if !responder.is_sent() {
                                    responder
                                        .send(500, internal_error_body("Internal server error"));
                                }
                            }
                        }
                    }
                })
        };

        spawn_result.map_err(|e| {
            anyhow::anyhow!("failed to spawn coroutine for route {route_key}: {e}")
        })?;

        info!(
            route = %route_key,
            total_routes = self.handlers.len() + 1,
            "Route registered"
        );
        self.handlers.insert(route_key, tx);
        Ok(())
    }

    /// Send a request to its route coroutine and wait for the reply.
    ///
    /// Returns `None` when no route is registered under `route_key`. A broken
    /// reply channel is answered with a 500 so the connection never hangs.
    #[must_use]
    pub fn dispatch(&self, route_key: &str, request: RouteRequest) -> Option<EnvelopeReply> {
        let tx = match self.handlers.get(route_key) {
            Some(tx) => tx,
            None => {
                error!(
                    route = %route_key,
                    available_routes = self.handlers.len(),
                    "No coroutine registered for route"
                );
                return None;
            }
        };

        let (reply_tx, reply_rx) = mpsc::channel();
        debug!(route = %route_key, method = %request.method, path = %request.path, "Dispatching request");

        if let Err(e) = tx.send(RouteInvocation { request, reply_tx }) {
            error!(route = %route_key, error = %e, "Failed to send request to route coroutine");
            return Some(EnvelopeReply {
                status: 500,
                body: internal_error_body("Internal server error"),
            });
        }

        match reply_rx.recv() {
            Ok(reply) => Some(reply),
            Err(e) => {
                error!(route = %route_key, error = %e, "Reply channel closed before a response arrived");
                Some(EnvelopeReply {
                    status: 500,
                    body: internal_error_body("Internal server error"),
                })
            }
        }
    }
}
