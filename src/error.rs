use std::fmt::Display;

use alloy::{contract, transports};

/// Error aborting the reduction of a block.
///
/// Any of these indicates an inconsistency in the event sequence or in the
/// store and should not be ignored, as continuing would corrupt
/// the indexed state.
#[derive(Debug, thiserror::Error)]
pub enum IndexerError {
    #[error("block out of order, expected: {0}, got: {1}")]
    BlockOutOfOrder(u64, u64),

    #[error("configuration not found: {0}")]
    ConfigurationNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unexpected empty RPC response")]
    NullResp,

    #[error("transport error: {0}")]
    Transport(String),
}

/// Failure of an outbound read call.
///
/// The reducers never propagate it, each call site maps it into
/// a default value instead.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CallError {
    #[error("call reverted: {0}")]
    Reverted(String),

    #[error("call transport error: {0}")]
    Transport(String),
}

pub type CallResult<T> = Result<T, CallError>;

impl From<contract::Error> for CallError {
    fn from(value: contract::Error) -> Self {
        match value {
            contract::Error::TransportError(rpc_err) => Self::from(rpc_err),
            contract::Error::PendingTransactionError(_) => Self::Transport(value.to_string()),
            // Empty return data, unknown selectors and ABI mismatches all mean the
            // target does not implement the call as expected
            _ => Self::Reverted(value.to_string()),
        }
    }
}

impl<E: Display> From<transports::RpcError<E>> for CallError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                let msg = resp.message.to_ascii_lowercase();
                if resp.code == 3 || msg.contains("revert") || msg.contains("invalid opcode") {
                    Self::Reverted(value.to_string())
                } else {
                    Self::Transport(value.to_string())
                }
            }
            _ => Self::Transport(value.to_string()),
        }
    }
}

impl<E: Display> From<transports::RpcError<E>> for IndexerError {
    fn from(value: transports::RpcError<E>) -> Self {
        match value {
            transports::RpcError::ErrorResp(ref resp) => {
                let msg = resp.message.to_ascii_lowercase();
                if (resp.code == -32600 || resp.code == -32601 || resp.code == -32602)
                    && (msg.contains("invalid") || msg.contains("not found"))
                {
                    Self::InvalidRequest(msg)
                } else {
                    Self::Transport(value.to_string())
                }
            }
            transports::RpcError::NullResp => Self::NullResp,
            _ => Self::Transport(value.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy::{
        rpc::json_rpc::ErrorPayload,
        transports::{RpcError, TransportErrorKind},
    };

    use super::*;

    fn error_resp(code: i64, message: &'static str) -> RpcError<TransportErrorKind> {
        RpcError::ErrorResp(ErrorPayload {
            code,
            message: message.into(),
            data: None,
        })
    }

    #[test]
    fn test_call_error_classification() {
        assert!(matches!(
            CallError::from(error_resp(3, "execution reverted")),
            CallError::Reverted(_)
        ));
        assert!(matches!(
            CallError::from(error_resp(-32000, "Execution Reverted: paused")),
            CallError::Reverted(_)
        ));
        assert!(matches!(
            CallError::from(error_resp(-32005, "rate limited")),
            CallError::Transport(_)
        ));
        assert!(matches!(
            CallError::from(RpcError::<TransportErrorKind>::NullResp),
            CallError::Transport(_)
        ));
    }

    #[test]
    fn test_indexer_error_classification() {
        assert!(matches!(
            IndexerError::from(error_resp(-32602, "invalid block range")),
            IndexerError::InvalidRequest(_)
        ));
        assert!(matches!(
            IndexerError::from(RpcError::<TransportErrorKind>::NullResp),
            IndexerError::NullResp
        ));
        assert!(matches!(
            IndexerError::from(error_resp(-32000, "header not found")),
            IndexerError::Transport(_)
        ));
    }
}
