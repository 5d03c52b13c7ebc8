use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    program_error::ProgramError,
    program_pack::{IsInitialized, Sealed},
    pubkey::Pubkey,
};

use super::MAX_CONSUMERS;

/// Fixed-size account stored with borsh, zero padded to `LEN`
pub trait AccountState: BorshSerialize + BorshDeserialize + IsInitialized + Sealed {
    const LEN: usize;

    fn load(data: &[u8]) -> Result<Self, ProgramError> {
        let state = Self::deserialize(&mut &data[..]).map_err(|_| ProgramError::InvalidAccountData)?;
        if !state.is_initialized() {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(state)
    }

    fn store(&self, data: &mut [u8]) -> Result<(), ProgramError> {
        if data.len() < Self::LEN {
            return Err(ProgramError::AccountDataTooSmall);
        }
        let mut cursor: &mut [u8] = data;
        self.serialize(&mut cursor)
            .map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}

/// Global coordinator configuration and id counters
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct CoordinatorState {
    pub is_initialized: bool,
    pub bump: u8,
    /// Flat fee charged per fulfillment
    pub base_fee: u64,
    /// Fee per unit of callback gas
    pub gas_price_link: u64,
    /// Id of the most recently created subscription
    pub current_sub_id: u64,
    /// Id of the most recently issued request
    pub request_counter: u64,
}

impl CoordinatorState {
    /// Fee charged for a fulfillment; the mock bills the full callback budget
    pub fn payment_for(&self, callback_gas_limit: u32) -> Option<u64> {
        self.gas_price_link
            .checked_mul(u64::from(callback_gas_limit))
            .and_then(|gas| gas.checked_add(self.base_fee))
    }
}

/// A prepaid billing account with its registered consumers
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Subscription {
    pub is_initialized: bool,
    pub bump: u8,
    pub sub_id: u64,
    pub owner: Pubkey,
    pub balance: u64,
    pub consumers: Vec<Pubkey>,
}

impl Subscription {
    pub fn is_consumer(&self, consumer: &Pubkey) -> bool {
        self.consumers.contains(consumer)
    }
}

/// An issued request awaiting fulfillment
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomWordsRequest {
    pub is_initialized: bool,
    pub request_id: u64,
    pub sub_id: u64,
    /// Account that signed the request and receives the callback
    pub consumer: Pubkey,
    /// Program that owns `consumer`
    pub consumer_program: Pubkey,
    pub gas_lane: [u8; 32],
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
    /// Slot the request was accepted in
    pub requested_at: u64,
}

impl Sealed for CoordinatorState {}
impl Sealed for Subscription {}
impl Sealed for RandomWordsRequest {}

impl IsInitialized for CoordinatorState {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for Subscription {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl IsInitialized for RandomWordsRequest {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl AccountState for CoordinatorState {
    const LEN: usize = 1 + 1 + 8 + 8 + 8 + 8;
}

impl AccountState for Subscription {
    const LEN: usize = 1 + 1 + 8 + 32 + 8 + 4 + 32 * MAX_CONSUMERS;
}

impl AccountState for RandomWordsRequest {
    const LEN: usize = 1 + 8 + 8 + 32 + 32 + 32 + 2 + 4 + 4 + 8;
}
