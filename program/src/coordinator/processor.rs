use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    instruction::AccountMeta,
    msg,
    program::{invoke_signed, set_return_data},
    program_error::ProgramError,
    pubkey::Pubkey,
    sysvar::Sysvar,
};

use super::{
    error::CoordinatorError,
    instruction::CoordinatorInstruction,
    state::{AccountState, CoordinatorState, RandomWordsRequest, Subscription},
    MAX_CONSUMERS, MAX_NUM_WORDS,
};
use crate::{
    events::{emit, CoordinatorEvent},
    instruction as raffle_instruction,
    utils::{self, COORDINATOR_SEED, REQUEST_SEED, SUBSCRIPTION_SEED},
    vrf,
};

pub struct Processor;

impl Processor {
    pub fn process(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = CoordinatorInstruction::unpack(instruction_data)?;

        match instruction {
            CoordinatorInstruction::Initialize {
                base_fee,
                gas_price_link,
            } => {
                msg!("Instruction: Initialize Coordinator");
                Self::process_initialize(program_id, accounts, base_fee, gas_price_link)
            }
            CoordinatorInstruction::CreateSubscription => {
                msg!("Instruction: Create Subscription");
                Self::process_create_subscription(program_id, accounts)
            }
            CoordinatorInstruction::FundSubscription { sub_id, amount } => {
                msg!("Instruction: Fund Subscription");
                Self::process_fund_subscription(program_id, accounts, sub_id, amount)
            }
            CoordinatorInstruction::AddConsumer { sub_id, consumer } => {
                msg!("Instruction: Add Consumer");
                Self::process_add_consumer(program_id, accounts, sub_id, consumer)
            }
            CoordinatorInstruction::RequestRandomWords {
                gas_lane,
                sub_id,
                request_confirmations,
                callback_gas_limit,
                num_words,
            } => {
                msg!("Instruction: Request Random Words");
                Self::process_request_random_words(
                    program_id,
                    accounts,
                    vrf::RandomWordsParams {
                        gas_lane,
                        sub_id,
                        request_confirmations,
                        callback_gas_limit,
                        num_words,
                    },
                )
            }
            CoordinatorInstruction::FulfillRandomWords {
                request_id,
                random_words_override,
            } => {
                msg!("Instruction: Fulfill Random Words");
                Self::process_fulfill_random_words(
                    program_id,
                    accounts,
                    request_id,
                    random_words_override,
                )
            }
        }
    }

    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        base_fee: u64,
        gas_price_link: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let state_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            msg!("Payer must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let (expected_state, bump) = utils::find_coordinator_address(program_id);
        if *state_info.key != expected_state {
            msg!("Invalid coordinator state address");
            return Err(ProgramError::InvalidSeeds);
        }
        if state_info.owner == program_id {
            msg!("Coordinator is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        utils::create_pda_account(
            payer_info,
            state_info,
            system_program_info,
            CoordinatorState::LEN,
            program_id,
            &[COORDINATOR_SEED, &[bump]],
        )?;

        let state = CoordinatorState {
            is_initialized: true,
            bump,
            base_fee,
            gas_price_link,
            current_sub_id: 0,
            request_counter: 0,
        };
        state.store(&mut state_info.data.borrow_mut())?;

        msg!(
            "Coordinator initialized: base fee={}, gas price={}",
            base_fee,
            gas_price_link
        );
        Ok(())
    }

    fn process_create_subscription(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let state_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !owner_info.is_signer {
            msg!("Subscription owner must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut state = Self::load_state(program_id, state_info)?;
        let sub_id = state
            .current_sub_id
            .checked_add(1)
            .ok_or(ProgramError::ArithmeticOverflow)?;

        let (expected_subscription, bump) = utils::find_subscription_address(program_id, sub_id);
        if *subscription_info.key != expected_subscription {
            msg!("Subscription account does not match id {}", sub_id);
            return Err(ProgramError::InvalidSeeds);
        }

        let sub_id_bytes = sub_id.to_le_bytes();
        utils::create_pda_account(
            owner_info,
            subscription_info,
            system_program_info,
            Subscription::LEN,
            program_id,
            &[SUBSCRIPTION_SEED, &sub_id_bytes, &[bump]],
        )?;

        let subscription = Subscription {
            is_initialized: true,
            bump,
            sub_id,
            owner: *owner_info.key,
            balance: 0,
            consumers: Vec::new(),
        };
        subscription.store(&mut subscription_info.data.borrow_mut())?;

        state.current_sub_id = sub_id;
        state.store(&mut state_info.data.borrow_mut())?;

        emit(&CoordinatorEvent::SubscriptionCreated {
            sub_id,
            owner: *owner_info.key,
        })?;
        set_return_data(&sub_id_bytes);
        Ok(())
    }

    fn process_fund_subscription(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        sub_id: u64,
        amount: u64,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let funder_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        if !funder_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut subscription = Self::load_subscription(program_id, subscription_info, sub_id)?;
        let old_balance = subscription.balance;
        subscription.balance = old_balance
            .checked_add(amount)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        subscription.store(&mut subscription_info.data.borrow_mut())?;

        emit(&CoordinatorEvent::SubscriptionFunded {
            sub_id,
            old_balance,
            new_balance: subscription.balance,
        })
    }

    fn process_add_consumer(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        sub_id: u64,
        consumer: Pubkey,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let owner_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;

        let mut subscription = Self::load_subscription(program_id, subscription_info, sub_id)?;
        if !owner_info.is_signer || subscription.owner != *owner_info.key {
            msg!("Only the owner of subscription {} may add consumers", sub_id);
            return Err(CoordinatorError::MustBeSubOwner.into());
        }

        if subscription.is_consumer(&consumer) {
            msg!("Consumer {} already registered", consumer);
            return Ok(());
        }
        if subscription.consumers.len() >= MAX_CONSUMERS {
            return Err(CoordinatorError::TooManyConsumers.into());
        }

        subscription.consumers.push(consumer);
        subscription.store(&mut subscription_info.data.borrow_mut())?;

        emit(&CoordinatorEvent::ConsumerAdded { sub_id, consumer })
    }

    fn process_request_random_words(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        params: vrf::RandomWordsParams,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let payer_info = next_account_info(account_info_iter)?;
        let consumer_info = next_account_info(account_info_iter)?;
        let state_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !payer_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let subscription = Self::load_subscription(program_id, subscription_info, params.sub_id)?;
        if !consumer_info.is_signer || !subscription.is_consumer(consumer_info.key) {
            msg!(
                "{} is not a consumer of subscription {}",
                consumer_info.key,
                params.sub_id
            );
            return Err(CoordinatorError::InvalidConsumer.into());
        }
        if params.num_words > MAX_NUM_WORDS {
            msg!("Requested {} words, at most {} allowed", params.num_words, MAX_NUM_WORDS);
            return Err(CoordinatorError::NumWordsTooBig.into());
        }

        let mut state = Self::load_state(program_id, state_info)?;
        let request_id = state
            .request_counter
            .checked_add(1)
            .ok_or(ProgramError::ArithmeticOverflow)?;

        let (expected_request, bump) = utils::find_request_address(program_id, request_id);
        if *request_info.key != expected_request {
            msg!("Request account does not match id {}", request_id);
            return Err(CoordinatorError::InvalidRequestAccount.into());
        }

        let request_id_bytes = request_id.to_le_bytes();
        utils::create_pda_account(
            payer_info,
            request_info,
            system_program_info,
            RandomWordsRequest::LEN,
            program_id,
            &[REQUEST_SEED, &request_id_bytes, &[bump]],
        )?;

        let request = RandomWordsRequest {
            is_initialized: true,
            request_id,
            sub_id: params.sub_id,
            consumer: *consumer_info.key,
            consumer_program: *consumer_info.owner,
            gas_lane: params.gas_lane,
            request_confirmations: params.request_confirmations,
            callback_gas_limit: params.callback_gas_limit,
            num_words: params.num_words,
            requested_at: Clock::get()?.slot,
        };
        request.store(&mut request_info.data.borrow_mut())?;

        state.request_counter = request_id;
        state.store(&mut state_info.data.borrow_mut())?;

        emit(&CoordinatorEvent::RandomWordsRequested {
            request_id,
            sub_id: params.sub_id,
            consumer: *consumer_info.key,
            gas_lane: params.gas_lane,
            request_confirmations: params.request_confirmations,
            callback_gas_limit: params.callback_gas_limit,
            num_words: params.num_words,
        })?;
        set_return_data(&request_id_bytes);
        Ok(())
    }

    fn process_fulfill_random_words(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        random_words_override: Vec<u64>,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let fulfiller_info = next_account_info(account_info_iter)?;
        let state_info = next_account_info(account_info_iter)?;
        let subscription_info = next_account_info(account_info_iter)?;
        let request_info = next_account_info(account_info_iter)?;
        let consumer_program_info = next_account_info(account_info_iter)?;
        let consumer_info = next_account_info(account_info_iter)?;
        let forwarded_infos = account_info_iter.as_slice();

        if !fulfiller_info.is_signer {
            return Err(ProgramError::MissingRequiredSignature);
        }

        let state = Self::load_state(program_id, state_info)?;

        let (expected_request, _) = utils::find_request_address(program_id, request_id);
        if *request_info.key != expected_request || request_info.owner != program_id {
            msg!("Request {} does not exist", request_id);
            return Err(CoordinatorError::UnrecognizedRequest.into());
        }
        let request = RandomWordsRequest::load(&request_info.data.borrow())
            .map_err(|_| CoordinatorError::UnrecognizedRequest)?;

        if request.consumer != *consumer_info.key
            || request.consumer_program != *consumer_program_info.key
        {
            msg!("Consumer accounts do not match request {}", request_id);
            return Err(CoordinatorError::InvalidConsumerCallback.into());
        }

        let mut subscription =
            Self::load_subscription(program_id, subscription_info, request.sub_id)?;

        let random_words = if random_words_override.is_empty() {
            vrf::default_random_words(request_id, request.num_words)
        } else if random_words_override.len() == request.num_words as usize {
            random_words_override
        } else {
            msg!(
                "Expected {} words, got {}",
                request.num_words,
                random_words_override.len()
            );
            return Err(CoordinatorError::InvalidRandomWords.into());
        };

        let payment = state
            .payment_for(request.callback_gas_limit)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        if subscription.balance < payment {
            msg!(
                "Subscription {} balance {} cannot cover payment {}",
                request.sub_id,
                subscription.balance,
                payment
            );
            return Err(CoordinatorError::InsufficientBalance.into());
        }

        let forwarded: Vec<AccountMeta> = forwarded_infos
            .iter()
            .map(|info| {
                if info.is_writable {
                    AccountMeta::new(*info.key, info.is_signer)
                } else {
                    AccountMeta::new_readonly(*info.key, info.is_signer)
                }
            })
            .collect();
        let callback = raffle_instruction::fulfill_random_words(
            consumer_program_info.key,
            state_info.key,
            consumer_info.key,
            &forwarded,
            request_id,
            random_words,
        )?;

        let mut callback_infos = vec![
            state_info.clone(),
            consumer_info.clone(),
            consumer_program_info.clone(),
        ];
        callback_infos.extend(forwarded_infos.iter().cloned());
        invoke_signed(&callback, &callback_infos, &[&[COORDINATOR_SEED, &[state.bump]]])?;

        subscription.balance -= payment;
        subscription.store(&mut subscription_info.data.borrow_mut())?;

        // Close the request so the id can never be fulfilled again
        let refund = request_info.lamports();
        let fulfiller_lamports = fulfiller_info
            .lamports()
            .checked_add(refund)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        **request_info.try_borrow_mut_lamports()? = 0;
        **fulfiller_info.try_borrow_mut_lamports()? = fulfiller_lamports;
        request_info.try_borrow_mut_data()?.fill(0);

        emit(&CoordinatorEvent::RandomWordsFulfilled {
            request_id,
            payment,
        })
    }

    fn load_state(
        program_id: &Pubkey,
        state_info: &AccountInfo,
    ) -> Result<CoordinatorState, ProgramError> {
        let (expected_state, _) = utils::find_coordinator_address(program_id);
        if *state_info.key != expected_state {
            msg!("Invalid coordinator state address {}", state_info.key);
            return Err(ProgramError::InvalidSeeds);
        }
        if state_info.owner != program_id {
            msg!("Coordinator state must be owned by the coordinator");
            return Err(ProgramError::IncorrectProgramId);
        }
        CoordinatorState::load(&state_info.data.borrow())
    }

    fn load_subscription(
        program_id: &Pubkey,
        subscription_info: &AccountInfo,
        sub_id: u64,
    ) -> Result<Subscription, ProgramError> {
        let (expected_subscription, _) = utils::find_subscription_address(program_id, sub_id);
        if *subscription_info.key != expected_subscription || subscription_info.owner != program_id
        {
            msg!("Subscription {} does not exist", sub_id);
            return Err(CoordinatorError::InvalidSubscription.into());
        }
        Subscription::load(&subscription_info.data.borrow())
            .map_err(|_| CoordinatorError::InvalidSubscription.into())
    }
}

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    Processor::process(program_id, accounts, instruction_data)
}
