//! RPC router and handler layer. Parses `NAMESPACE.Name`
//! requests, injects caller identity, dispatches through a plain registry
//! map rather than a macro-based dependency injection layer, and returns the
//! uniform `{id, result}` / `{id, error}` envelope.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod handlers;
pub mod seams;
pub mod wire;

pub use context::RpcContext;
pub use dispatch::{CallerIdentity, Dispatcher, HandlerFn};
pub use error::{RpcError, RpcErrorKind, RpcResult};
pub use seams::{GatewayError, LlmGateway, VectorStore};
pub use wire::{RpcFailure, RpcRequest, RpcResponse, RpcSuccess};
