// VRF coordinator integration for the raffle program
use arrayref::array_ref;
use solana_program::{
    account_info::AccountInfo,
    keccak,
    msg,
    program::{get_return_data, invoke_signed},
    program_error::ProgramError,
};

use crate::coordinator::{error::CoordinatorError, instruction as coordinator_instruction};

/// Parameters of a single randomness request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RandomWordsParams {
    pub gas_lane: [u8; 32],
    pub sub_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

/// Accounts the coordinator needs to accept a request from a consumer
pub struct RequestAccounts<'a, 'b> {
    pub payer: &'a AccountInfo<'b>,
    pub consumer: &'a AccountInfo<'b>,
    pub coordinator_program: &'a AccountInfo<'b>,
    pub coordinator_state: &'a AccountInfo<'b>,
    pub subscription: &'a AccountInfo<'b>,
    pub request: &'a AccountInfo<'b>,
    pub system_program: &'a AccountInfo<'b>,
}

/// Submit a randomness request to the coordinator, signing as the consumer PDA.
///
/// Returns the request id the coordinator assigned. The words arrive later
/// through a separate fulfillment callback.
pub fn request_random_words(
    accounts: RequestAccounts,
    params: RandomWordsParams,
    consumer_seeds: &[&[u8]],
) -> Result<u64, ProgramError> {
    let instruction = coordinator_instruction::request_random_words(
        accounts.coordinator_program.key,
        accounts.payer.key,
        accounts.consumer.key,
        accounts.request.key,
        params,
    )?;

    invoke_signed(
        &instruction,
        &[
            accounts.payer.clone(),
            accounts.consumer.clone(),
            accounts.coordinator_state.clone(),
            accounts.subscription.clone(),
            accounts.request.clone(),
            accounts.system_program.clone(),
            accounts.coordinator_program.clone(),
        ],
        &[consumer_seeds],
    )?;

    let (program_id, data) = get_return_data().ok_or(CoordinatorError::InvalidRequestAccount)?;
    if program_id != *accounts.coordinator_program.key || data.len() != 8 {
        msg!("Coordinator did not return a request id");
        return Err(CoordinatorError::InvalidRequestAccount.into());
    }
    let request_id = u64::from_le_bytes(*array_ref![data, 0, 8]);

    msg!("VRF randomness requested, request id {}", request_id);
    Ok(request_id)
}

/// Words the coordinator delivers when no override is supplied.
///
/// Word `i` is the first eight bytes of `keccak(request_id || i)`, little endian.
pub fn default_random_words(request_id: u64, num_words: u32) -> Vec<u64> {
    (0..num_words)
        .map(|i| {
            let hash = keccak::hashv(&[&request_id.to_le_bytes(), &u64::from(i).to_le_bytes()]);
            let bytes = hash.to_bytes();
            u64::from_le_bytes(*array_ref![bytes, 0, 8])
        })
        .collect()
}

/// Get a winner index from a random word
pub fn winner_index(random_word: u64, player_count: usize) -> usize {
    if player_count == 0 {
        return 0;
    }
    (random_word % player_count as u64) as usize
}
