use solana_program::{
    account_info::{next_account_info, AccountInfo},
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::{clock::Clock, Sysvar},
};

use crate::{
    error::RaffleError,
    events::{emit, RaffleEvent},
    instruction::RaffleInstruction,
    state::{Raffle, RaffleConfig, REQUEST_CONFIRMATIONS},
    utils::{self, RAFFLE_SEED},
    vrf,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::Initialize {
                entrance_fee,
                gas_lane,
                subscription_id,
                callback_gas_limit,
                interval,
            } => {
                msg!("Instruction: Initialize");
                Self::process_initialize(
                    program_id,
                    accounts,
                    entrance_fee,
                    gas_lane,
                    subscription_id,
                    callback_gas_limit,
                    interval,
                )
            }
            RaffleInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(program_id, accounts, amount)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(program_id, accounts)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(program_id, accounts)
            }
            RaffleInstruction::FulfillRandomWords {
                request_id,
                random_words,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(program_id, accounts, request_id, &random_words)
            }
        }
    }

    /// Creates the raffle PDA for the signing authority.
    ///
    /// The coordinator is fixed to the program passed in as account 2 and can
    /// never be changed afterwards.
    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        entrance_fee: u64,
        gas_lane: [u8; 32],
        subscription_id: u64,
        callback_gas_limit: u32,
        interval: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_program_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !authority_info.is_signer {
            msg!("Authority must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }
        if interval == 0 {
            msg!("Interval must be at least one second");
            return Err(ProgramError::InvalidArgument);
        }

        let (expected_raffle, bump) = utils::find_raffle_address(program_id, authority_info.key);
        if *raffle_info.key != expected_raffle {
            msg!("Invalid raffle account address");
            return Err(ProgramError::InvalidSeeds);
        }
        if raffle_info.owner == program_id {
            msg!("Raffle account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        utils::create_pda_account(
            authority_info,
            raffle_info,
            system_program_info,
            Raffle::LEN,
            program_id,
            &[RAFFLE_SEED, authority_info.key.as_ref(), &[bump]],
        )?;

        let config = RaffleConfig {
            coordinator: *coordinator_program_info.key,
            entrance_fee,
            gas_lane,
            subscription_id,
            request_confirmations: REQUEST_CONFIRMATIONS,
            callback_gas_limit,
            interval,
        };
        let now = Clock::get()?.unix_timestamp;
        let raffle = Raffle::new(*authority_info.key, bump, config, now);
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!(
            "Raffle initialized: entrance fee={} SOL, interval={}s, coordinator={}",
            utils::lamports_to_sol(entrance_fee),
            interval,
            coordinator_program_info.key
        );
        Ok(())
    }

    fn process_enter(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(program_id, raffle_info)?;
        raffle.enter(*player_info.key, amount)?;

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, amount),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        let player_count = raffle.number_of_players();
        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        msg!("Player {} entered, {} in the round", player_info.key, player_count);
        emit(&RaffleEvent::RaffleEnter {
            player: *player_info.key,
        })
    }

    fn process_check_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(program_id, raffle_info)?;
        let now = Clock::get()?.unix_timestamp;
        let status = raffle.upkeep_status(now, utils::spendable_lamports(raffle_info)?);

        msg!(
            "Upkeep needed: {} (balance={}, players={}, state={:?}, time passed={})",
            status.upkeep_needed,
            status.balance,
            status.player_count,
            status.state,
            status.time_passed
        );
        set_return_data(&[status.upkeep_needed as u8]);
        Ok(())
    }

    fn process_perform_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let keeper_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let coordinator_program_info = next_account_info(account_info_iter)?;
        let coordinator_state_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !keeper_info.is_signer {
            msg!("Keeper must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(program_id, raffle_info)?;
        if *coordinator_program_info.key != raffle.config.coordinator {
            msg!("Coordinator program does not match the raffle configuration");
            return Err(ProgramError::IncorrectProgramId);
        }
        let (expected_state, _) = utils::find_coordinator_address(coordinator_program_info.key);
        if *coordinator_state_info.key != expected_state {
            msg!("Invalid coordinator state address {}", coordinator_state_info.key);
            return Err(ProgramError::InvalidSeeds);
        }

        let now = Clock::get()?.unix_timestamp;
        let balance = utils::spendable_lamports(raffle_info)?;
        if let Err(status) = raffle.begin_calculating(now, balance) {
            msg!(
                "Upkeep not needed: balance={}, players={}, state={}",
                status.balance,
                status.player_count,
                u8::from(status.state)
            );
            return Err(RaffleError::UpkeepNotNeeded.into());
        }

        let params = vrf::RandomWordsParams {
            gas_lane: raffle.config.gas_lane,
            sub_id: raffle.config.subscription_id,
            request_confirmations: raffle.request_confirmations(),
            callback_gas_limit: raffle.config.callback_gas_limit,
            num_words: raffle.num_words(),
        };
        let request_id = vrf::request_random_words(
            vrf::RequestAccounts {
                payer: keeper_info,
                consumer: raffle_info,
                coordinator_program: coordinator_program_info,
                coordinator_state: coordinator_state_info,
                subscription: subscription_info,
                request: request_info,
                system_program: system_program_info,
            },
            params,
            &[RAFFLE_SEED, raffle.authority.as_ref(), &[raffle.bump]],
        )?;

        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        set_return_data(&request_id.to_le_bytes());
        emit(&RaffleEvent::RequestedRaffleWinner { request_id })
    }

    /// Settles the round with words delivered by the coordinator and pays the
    /// whole pot above the rent reserve to the winner.
    fn process_fulfill_random_words(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        random_words: &[u64],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let coordinator_authority_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut raffle = Self::load_raffle(program_id, raffle_info)?;

        let (expected_authority, _) = utils::find_coordinator_address(&raffle.config.coordinator);
        if !coordinator_authority_info.is_signer
            || *coordinator_authority_info.key != expected_authority
        {
            msg!(
                "Only the coordinator can fulfill, got {}",
                coordinator_authority_info.key
            );
            return Err(RaffleError::OnlyCoordinatorCanFulfill.into());
        }

        let prize = utils::spendable_lamports(raffle_info)?;
        let now = Clock::get()?.unix_timestamp;
        let winner = raffle.settle(random_words, now)?;

        if *winner_info.key != winner {
            msg!("Winner account {} does not match {}", winner_info.key, winner);
            return Err(RaffleError::WinnerAccountMismatch.into());
        }
        if !winner_info.is_writable {
            msg!("Winner account must be writable");
            return Err(RaffleError::TransferFailed.into());
        }

        Raffle::pack(raffle, &mut raffle_info.data.borrow_mut())?;

        let raffle_lamports = raffle_info
            .lamports()
            .checked_sub(prize)
            .ok_or(RaffleError::TransferFailed)?;
        let winner_lamports = winner_info
            .lamports()
            .checked_add(prize)
            .ok_or(RaffleError::TransferFailed)?;
        **raffle_info.try_borrow_mut_lamports()? = raffle_lamports;
        **winner_info.try_borrow_mut_lamports()? = winner_lamports;

        msg!(
            "Request {} settled: {} won {} SOL",
            request_id,
            winner,
            utils::lamports_to_sol(prize)
        );
        emit(&RaffleEvent::WinnerPicked { winner })
    }

    fn load_raffle(program_id: &Pubkey, raffle_info: &AccountInfo) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(RaffleError::InvalidRaffleAccount.into());
        }
        Raffle::unpack(&raffle_info.data.borrow())
    }
}

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    Processor::process(program_id, accounts, instruction_data)
}
