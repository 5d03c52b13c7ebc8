use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the mock VRF coordinator
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// Request id was never issued or has already been fulfilled
    #[error("nonexistent request")]
    UnrecognizedRequest = 100,

    #[error("Invalid subscription")]
    InvalidSubscription,

    /// Consumer is not registered on the subscription or did not sign
    #[error("Invalid consumer")]
    InvalidConsumer,

    #[error("Must be subscription owner")]
    MustBeSubOwner,

    #[error("Too many consumers")]
    TooManyConsumers,

    /// Subscription cannot cover the fulfillment payment
    #[error("Insufficient subscription balance")]
    InsufficientBalance,

    #[error("Too many random words requested")]
    NumWordsTooBig,

    /// Override word list does not match the requested count
    #[error("Invalid random words")]
    InvalidRandomWords,

    #[error("Invalid request account")]
    InvalidRequestAccount,

    /// Consumer accounts do not match the stored request
    #[error("Invalid consumer callback accounts")]
    InvalidConsumerCallback,
}

impl From<CoordinatorError> for ProgramError {
    fn from(e: CoordinatorError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for CoordinatorError {
    fn type_of() -> &'static str {
        "Coordinator Error"
    }
}

impl PrintProgramError for CoordinatorError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
