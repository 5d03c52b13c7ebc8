use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};
use std::convert::TryInto;

use crate::{error::RaffleError, utils};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RaffleInstruction {
    /// Create the raffle PDA and fix its configuration
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The authority deploying the raffle, pays for the account
    /// 1. `[writable]` The raffle account (PDA of `["raffle", authority]`)
    /// 2. `[]` The VRF coordinator program
    /// 3. `[]` The system program
    Initialize {
        /// Minimum entrance payment in lamports
        entrance_fee: u64,
        /// Coordinator key hash
        gas_lane: [u8; 32],
        /// Coordinator subscription funding the callbacks
        subscription_id: u64,
        /// Compute budget for the fulfillment callback
        callback_gas_limit: u32,
        /// Seconds between draws
        interval: u64,
    },

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the entrance fee
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    Enter {
        /// Lamports paid, must cover the entrance fee
        amount: u64,
    },

    /// Evaluate the upkeep predicate; the answer is returned as a single byte of return data
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep,

    /// Close the round and request a random word from the coordinator.
    /// The request id is returned as little-endian return data.
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The keeper, pays for the request account
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The VRF coordinator program
    /// 3. `[writable]` The coordinator state account
    /// 4. `[]` The subscription account
    /// 5. `[writable]` The request account for the next request id
    /// 6. `[]` The system program
    PerformUpkeep,

    /// Coordinator callback delivering the random words
    ///
    /// Accounts expected:
    /// 0. `[signer]` The coordinator state PDA
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The selected winner
    FulfillRandomWords {
        request_id: u64,
        random_words: Vec<u64>,
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        let (tag, rest) = input
            .split_first()
            .ok_or(RaffleError::InvalidInstruction)?;

        Ok(match tag {
            0 => {
                let (entrance_fee, rest) = Self::unpack_u64(rest)?;
                let (gas_lane, rest) = Self::unpack_fixed_bytes::<32>(rest)?;
                let (subscription_id, rest) = Self::unpack_u64(rest)?;
                let (callback_gas_limit, rest) = Self::unpack_u32(rest)?;
                let (interval, _) = Self::unpack_u64(rest)?;
                Self::Initialize {
                    entrance_fee,
                    gas_lane,
                    subscription_id,
                    callback_gas_limit,
                    interval,
                }
            }
            1 => {
                let (amount, _) = Self::unpack_u64(rest)?;
                Self::Enter { amount }
            }
            2 => Self::CheckUpkeep,
            3 => Self::PerformUpkeep,
            4 => {
                let (request_id, rest) = Self::unpack_u64(rest)?;
                let (count, mut rest) = Self::unpack_u32(rest)?;
                if rest.len() / 8 < count as usize {
                    return Err(RaffleError::InvalidInstruction.into());
                }
                let mut random_words = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    let (word, remaining) = Self::unpack_u64(rest)?;
                    random_words.push(word);
                    rest = remaining;
                }
                Self::FulfillRandomWords {
                    request_id,
                    random_words,
                }
            }
            _ => return Err(RaffleError::InvalidInstruction.into()),
        })
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        match self {
            Self::Initialize {
                entrance_fee,
                gas_lane,
                subscription_id,
                callback_gas_limit,
                interval,
            } => {
                buf.push(0);
                buf.extend_from_slice(&entrance_fee.to_le_bytes());
                buf.extend_from_slice(gas_lane);
                buf.extend_from_slice(&subscription_id.to_le_bytes());
                buf.extend_from_slice(&callback_gas_limit.to_le_bytes());
                buf.extend_from_slice(&interval.to_le_bytes());
            }
            Self::Enter { amount } => {
                buf.push(1);
                buf.extend_from_slice(&amount.to_le_bytes());
            }
            Self::CheckUpkeep => buf.push(2),
            Self::PerformUpkeep => buf.push(3),
            Self::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                buf.push(4);
                buf.extend_from_slice(&request_id.to_le_bytes());
                buf.extend_from_slice(&(random_words.len() as u32).to_le_bytes());
                for word in random_words {
                    buf.extend_from_slice(&word.to_le_bytes());
                }
            }
        }
        buf
    }

    fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<8>(input)?;
        Ok((u64::from_le_bytes(bytes), rest))
    }

    fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
        let (bytes, rest) = Self::unpack_fixed_bytes::<4>(input)?;
        Ok((u32::from_le_bytes(bytes), rest))
    }

    fn unpack_fixed_bytes<const N: usize>(input: &[u8]) -> Result<([u8; N], &[u8]), ProgramError> {
        if input.len() < N {
            return Err(RaffleError::InvalidInstruction.into());
        }
        let (bytes, rest) = input.split_at(N);
        let bytes = bytes
            .try_into()
            .map_err(|_| ProgramError::from(RaffleError::InvalidInstruction))?;
        Ok((bytes, rest))
    }
}

/// Create initialize instruction
#[allow(clippy::too_many_arguments)]
pub fn initialize(
    program_id: &Pubkey,
    authority: &Pubkey,
    coordinator_program: &Pubkey,
    entrance_fee: u64,
    gas_lane: [u8; 32],
    subscription_id: u64,
    callback_gas_limit: u32,
    interval: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::Initialize {
        entrance_fee,
        gas_lane,
        subscription_id,
        callback_gas_limit,
        interval,
    }
    .pack();
    let (raffle, _) = utils::find_raffle_address(program_id, authority);

    let accounts = vec![
        AccountMeta::new(*authority, true),
        AccountMeta::new(raffle, false),
        AccountMeta::new_readonly(*coordinator_program, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::Enter { amount }.pack();

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*raffle, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle: &Pubkey) -> Result<Instruction, ProgramError> {
    Ok(Instruction {
        program_id: *program_id,
        accounts: vec![AccountMeta::new_readonly(*raffle, false)],
        data: RaffleInstruction::CheckUpkeep.pack(),
    })
}

/// Create perform_upkeep instruction
///
/// `request_id` must be the id the coordinator will hand out next, i.e. its
/// current request counter plus one.
pub fn perform_upkeep(
    program_id: &Pubkey,
    keeper: &Pubkey,
    raffle: &Pubkey,
    coordinator_program: &Pubkey,
    subscription_id: u64,
    request_id: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::PerformUpkeep.pack();
    let (coordinator_state, _) = utils::find_coordinator_address(coordinator_program);
    let (subscription, _) = utils::find_subscription_address(coordinator_program, subscription_id);
    let (request, _) = utils::find_request_address(coordinator_program, request_id);

    let accounts = vec![
        AccountMeta::new(*keeper, true),
        AccountMeta::new(*raffle, false),
        AccountMeta::new_readonly(*coordinator_program, false),
        AccountMeta::new(coordinator_state, false),
        AccountMeta::new_readonly(subscription, false),
        AccountMeta::new(request, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_random_words instruction, as issued by the coordinator
pub fn fulfill_random_words(
    program_id: &Pubkey,
    coordinator_authority: &Pubkey,
    raffle: &Pubkey,
    forwarded: &[AccountMeta],
    request_id: u64,
    random_words: Vec<u64>,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::FulfillRandomWords {
        request_id,
        random_words,
    }
    .pack();

    let mut accounts = vec![
        AccountMeta::new_readonly(*coordinator_authority, true),
        AccountMeta::new(*raffle, false),
    ];
    accounts.extend_from_slice(forwarded);

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}
