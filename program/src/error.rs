use solana_program::{
    decode_error::DecodeError, msg, program_error::PrintProgramError, program_error::ProgramError,
};
use thiserror::Error;

/// Errors that may be returned by the Raffle program
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Payment is below the entrance fee
    #[error("Not enough lamports entered")]
    InsufficientPayment,

    /// Raffle is calculating a winner
    #[error("Raffle is not open")]
    RaffleNotOpen,

    /// Upkeep predicate evaluated false
    #[error("Upkeep not needed")]
    UpkeepNotNeeded,

    /// Prize could not be moved to the winner
    #[error("Transfer to winner failed")]
    TransferFailed,

    /// Fulfillment arrived while no request was outstanding
    #[error("Raffle is not calculating a winner")]
    RaffleNotCalculating,

    /// No room left for another entrant this round
    #[error("Raffle is full")]
    RaffleFull,

    /// Callback did not come from the configured coordinator
    #[error("Only the coordinator can fulfill randomness")]
    OnlyCoordinatorCanFulfill,

    /// Supplied winner account is not the selected player
    #[error("Winner account does not match the selected player")]
    WinnerAccountMismatch,

    /// Coordinator delivered an empty word list
    #[error("No random words supplied")]
    NoRandomWords,

    /// Invalid instruction data passed
    #[error("Invalid instruction data")]
    InvalidInstruction,

    /// Raffle account address or owner is wrong
    #[error("Invalid raffle account")]
    InvalidRaffleAccount,

    /// Winner index past the end of the current round during settlement
    #[error("Player index out of range")]
    PlayerIndexOutOfRange,
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ProgramError::from(RaffleError::InsufficientPayment), ProgramError::Custom(0));
        assert_eq!(ProgramError::from(RaffleError::RaffleNotOpen), ProgramError::Custom(1));
        assert_eq!(ProgramError::from(RaffleError::UpkeepNotNeeded), ProgramError::Custom(2));
        assert_eq!(ProgramError::from(RaffleError::TransferFailed), ProgramError::Custom(3));
        assert_eq!(
            ProgramError::from(RaffleError::PlayerIndexOutOfRange),
            ProgramError::Custom(11)
        );
    }
}
