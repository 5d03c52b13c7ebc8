use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::{utils, vrf::RandomWordsParams};

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum CoordinatorInstruction {
    /// Create the coordinator state PDA
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer
    /// 1. `[writable]` Coordinator state (PDA of `["coordinator"]`)
    /// 2. `[]` System program
    Initialize { base_fee: u64, gas_price_link: u64 },

    /// Open a new subscription owned by the signer
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Owner, pays for the subscription account
    /// 1. `[writable]` Coordinator state
    /// 2. `[writable]` Subscription PDA for `current_sub_id + 1`
    /// 3. `[]` System program
    CreateSubscription,

    /// Credit a subscription's balance
    ///
    /// Accounts expected:
    /// 0. `[signer]` Funder
    /// 1. `[writable]` Subscription
    FundSubscription { sub_id: u64, amount: u64 },

    /// Allow `consumer` to request randomness billed to the subscription
    ///
    /// Accounts expected:
    /// 0. `[signer]` Subscription owner
    /// 1. `[writable]` Subscription
    AddConsumer { sub_id: u64, consumer: Pubkey },

    /// Accept a randomness request; the request id is set as return data
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Payer for the request account
    /// 1. `[signer]` Consumer; its owner program receives the callback
    /// 2. `[writable]` Coordinator state
    /// 3. `[]` Subscription
    /// 4. `[writable]` Request PDA for `request_counter + 1`
    /// 5. `[]` System program
    RequestRandomWords {
        gas_lane: [u8; 32],
        sub_id: u64,
        request_confirmations: u16,
        callback_gas_limit: u32,
        num_words: u32,
    },

    /// Deliver words to the consumer and close the request.
    /// An empty override uses words derived from the request id.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` Fulfiller, receives the request account's rent
    /// 1. `[]` Coordinator state, signs the callback
    /// 2. `[writable]` Subscription billed for the fulfillment
    /// 3. `[writable]` Request
    /// 4. `[]` Consumer program
    /// 5. `[writable]` Consumer
    /// 6.. Accounts forwarded to the consumer callback
    FulfillRandomWords {
        request_id: u64,
        random_words_override: Vec<u64>,
    },
}

impl CoordinatorInstruction {
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }

    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        borsh::to_vec(self).map_err(|e| ProgramError::BorshIoError(e.to_string()))
    }
}

pub fn initialize(
    program_id: &Pubkey,
    payer: &Pubkey,
    base_fee: u64,
    gas_price_link: u64,
) -> Result<Instruction, ProgramError> {
    let (coordinator_state, _) = utils::find_coordinator_address(program_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new(coordinator_state, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: CoordinatorInstruction::Initialize {
            base_fee,
            gas_price_link,
        }
        .pack()?,
    })
}

/// `sub_id` must be the id the coordinator will assign next
pub fn create_subscription(
    program_id: &Pubkey,
    owner: &Pubkey,
    sub_id: u64,
) -> Result<Instruction, ProgramError> {
    let (coordinator_state, _) = utils::find_coordinator_address(program_id);
    let (subscription, _) = utils::find_subscription_address(program_id, sub_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*owner, true),
            AccountMeta::new(coordinator_state, false),
            AccountMeta::new(subscription, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: CoordinatorInstruction::CreateSubscription.pack()?,
    })
}

pub fn fund_subscription(
    program_id: &Pubkey,
    funder: &Pubkey,
    sub_id: u64,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let (subscription, _) = utils::find_subscription_address(program_id, sub_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*funder, true),
            AccountMeta::new(subscription, false),
        ],
        data: CoordinatorInstruction::FundSubscription { sub_id, amount }.pack()?,
    })
}

pub fn add_consumer(
    program_id: &Pubkey,
    owner: &Pubkey,
    sub_id: u64,
    consumer: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let (subscription, _) = utils::find_subscription_address(program_id, sub_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new_readonly(*owner, true),
            AccountMeta::new(subscription, false),
        ],
        data: CoordinatorInstruction::AddConsumer {
            sub_id,
            consumer: *consumer,
        }
        .pack()?,
    })
}

pub fn request_random_words(
    program_id: &Pubkey,
    payer: &Pubkey,
    consumer: &Pubkey,
    request: &Pubkey,
    params: RandomWordsParams,
) -> Result<Instruction, ProgramError> {
    let (coordinator_state, _) = utils::find_coordinator_address(program_id);
    let (subscription, _) = utils::find_subscription_address(program_id, params.sub_id);

    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*consumer, true),
            AccountMeta::new(coordinator_state, false),
            AccountMeta::new_readonly(subscription, false),
            AccountMeta::new(*request, false),
            AccountMeta::new_readonly(system_program::id(), false),
        ],
        data: CoordinatorInstruction::RequestRandomWords {
            gas_lane: params.gas_lane,
            sub_id: params.sub_id,
            request_confirmations: params.request_confirmations,
            callback_gas_limit: params.callback_gas_limit,
            num_words: params.num_words,
        }
        .pack()?,
    })
}

#[allow(clippy::too_many_arguments)]
pub fn fulfill_random_words(
    program_id: &Pubkey,
    fulfiller: &Pubkey,
    sub_id: u64,
    request_id: u64,
    consumer_program: &Pubkey,
    consumer: &Pubkey,
    forwarded: &[AccountMeta],
    random_words_override: Vec<u64>,
) -> Result<Instruction, ProgramError> {
    let (coordinator_state, _) = utils::find_coordinator_address(program_id);
    let (subscription, _) = utils::find_subscription_address(program_id, sub_id);
    let (request, _) = utils::find_request_address(program_id, request_id);

    let mut accounts = vec![
        AccountMeta::new(*fulfiller, true),
        AccountMeta::new_readonly(coordinator_state, false),
        AccountMeta::new(subscription, false),
        AccountMeta::new(request, false),
        AccountMeta::new_readonly(*consumer_program, false),
        AccountMeta::new(*consumer, false),
    ];
    accounts.extend_from_slice(forwarded);

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data: CoordinatorInstruction::FulfillRandomWords {
            request_id,
            random_words_override,
        }
        .pack()?,
    })
}
