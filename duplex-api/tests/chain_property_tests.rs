//! Property-Based Tests for middleware chain construction and recovery
//!
//! **Property: Stage order**
//!
//! A stage list is accepted exactly when it starts with Recovery, is strictly
//! increasing in canonical order, and (on HTTP) omits StatusTranslation.
//!
//! **Property: Outcome preservation**
//!
//! For any handler outcome, the chain returns the same value or the same
//! error code; a panicking handler always yields an internal error.

use duplex_api::{ApiError, ApiResult, ChainError, ErrorCode, MiddlewareChain, Stage, Transport};
use proptest::prelude::*;
use proptest::test_runner::TestCaseError;

// ============================================================================
// TEST CONFIGURATION
// ============================================================================

fn test_runtime() -> Result<tokio::runtime::Runtime, TestCaseError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| TestCaseError::fail(format!("Failed to create runtime: {}", e)))
}

// ============================================================================
// PROPERTY TEST STRATEGIES
// ============================================================================

fn stage_strategy() -> impl Strategy<Value = Stage> {
    prop_oneof![
        Just(Stage::Recovery),
        Just(Stage::StatusTranslation),
        Just(Stage::Tracing),
        Just(Stage::Logging),
    ]
}

fn transport_strategy() -> impl Strategy<Value = Transport> {
    prop_oneof![Just(Transport::Grpc), Just(Transport::Http)]
}

fn error_code_strategy() -> impl Strategy<Value = ErrorCode> {
    prop_oneof![
        Just(ErrorCode::ValidationFailed),
        Just(ErrorCode::MissingField),
        Just(ErrorCode::InvalidInput),
        Just(ErrorCode::EntityNotFound),
        Just(ErrorCode::StateConflict),
        Just(ErrorCode::InternalError),
        Just(ErrorCode::StorageFailed),
        Just(ErrorCode::ServiceUnavailable),
        Just(ErrorCode::Timeout),
    ]
}

fn is_valid(transport: Transport, stages: &[Stage]) -> bool {
    stages.first() == Some(&Stage::Recovery)
        && stages.windows(2).all(|pair| pair[0] < pair[1])
        && !(transport == Transport::Http && stages.contains(&Stage::StatusTranslation))
}

async fn explode(message: String) -> ApiResult<()> {
    panic!("{}", message)
}

fn chain_for(transport: Transport) -> MiddlewareChain {
    match transport {
        Transport::Grpc => MiddlewareChain::grpc(),
        Transport::Http => MiddlewareChain::http(),
    }
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_only_canonical_orders_accepted(
        transport in transport_strategy(),
        stages in prop::collection::vec(stage_strategy(), 0..6),
    ) {
        let result = MiddlewareChain::new(transport, stages.clone());
        prop_assert_eq!(result.is_ok(), is_valid(transport, &stages));

        if let Err(err) = result {
            match err {
                ChainError::MissingRecovery => {
                    prop_assert_ne!(stages.first(), Some(&Stage::Recovery))
                }
                ChainError::Duplicate(stage) => {
                    prop_assert!(stages.iter().filter(|s| **s == stage).count() > 1)
                }
                ChainError::OutOfOrder { .. } => {
                    prop_assert!(stages.windows(2).any(|pair| pair[0] > pair[1]))
                }
                ChainError::TranslationOnHttp => {
                    prop_assert_eq!(transport, Transport::Http)
                }
            }
        }
    }

    #[test]
    fn prop_outcome_preserved(
        transport in transport_strategy(),
        outcome in prop::result::maybe_ok(any::<u32>(), error_code_strategy()),
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let chain = chain_for(transport);
            let handler_result: ApiResult<u32> = outcome.map_err(ApiError::from_code);
            let result = chain.run("prop", async move { handler_result }).await;
            match (outcome, result) {
                (Ok(expected), Ok(actual)) => {
                    prop_assert_eq!(expected, actual)
                }
                (Err(code), Err(err)) => {
                    prop_assert_eq!(code, err.code);
                    let status: tonic::Status = err.into();
                    if transport == Transport::Grpc {
                        prop_assert_eq!(status.code(), code.rpc_code());
                    } else {
                        prop_assert_eq!(status.code(), tonic::Code::Unknown);
                    }
                }
                (expected, actual) => {
                    return Err(TestCaseError::fail(format!("{:?} became {:?}", expected, actual)))
                }
            }
            Ok(())
        })?;
    }

    #[test]
    fn prop_panic_always_recovered(
        transport in transport_strategy(),
        message in "boom-[a-z]{4,12}",
    ) {
        let rt = test_runtime()?;
        rt.block_on(async {
            let chain = chain_for(transport);
            let result = chain.run("prop", explode(message.clone())).await;
            let err = result.err().ok_or_else(|| TestCaseError::fail("panic not reported"))?;
            prop_assert_eq!(err.code, ErrorCode::InternalError);
            prop_assert!(!err.message.contains(&message));
            Ok(())
        })?;
    }
}
