// Program events, logged as borsh-encoded `Program data:` entries for off-chain indexers
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    entrypoint::ProgramResult, log::sol_log_data, msg, program_error::ProgramError,
    pubkey::Pubkey,
};
use std::fmt::Debug;

/// Events emitted by the raffle program
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// A player joined the current round
    RaffleEnter { player: Pubkey },
    /// Upkeep closed the round and asked the coordinator for randomness
    RequestedRaffleWinner { request_id: u64 },
    /// The round was settled and paid out
    WinnerPicked { winner: Pubkey },
}

/// Events emitted by the mock coordinator
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorEvent {
    SubscriptionCreated {
        sub_id: u64,
        owner: Pubkey,
    },
    SubscriptionFunded {
        sub_id: u64,
        old_balance: u64,
        new_balance: u64,
    },
    ConsumerAdded {
        sub_id: u64,
        consumer: Pubkey,
    },
    RandomWordsRequested {
        request_id: u64,
        sub_id: u64,
        consumer: Pubkey,
        gas_lane: [u8; 32],
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },
    RandomWordsFulfilled {
        request_id: u64,
        payment: u64,
    },
}

/// Log `event` both as readable text and as a structured data entry
pub fn emit<E: BorshSerialize + Debug>(event: &E) -> ProgramResult {
    msg!("Event: {:?}", event);
    let data = borsh::to_vec(event).map_err(|e| ProgramError::BorshIoError(e.to_string()))?;
    sol_log_data(&[&data]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_decode_from_their_log_payload() {
        let event = RaffleEvent::RequestedRaffleWinner { request_id: 1 };
        let data = borsh::to_vec(&event).unwrap();
        assert_eq!(data[0], 1);
        assert_eq!(RaffleEvent::try_from_slice(&data).unwrap(), event);
        emit(&event).unwrap();
    }

    #[test]
    fn fulfillment_event_carries_request_and_payment() {
        let event = CoordinatorEvent::RandomWordsFulfilled {
            request_id: 3,
            payment: 250_000,
        };
        let data = borsh::to_vec(&event).unwrap();
        assert_eq!(data.len(), 1 + 8 + 8);
        assert_eq!(CoordinatorEvent::try_from_slice(&data).unwrap(), event);
    }
}
