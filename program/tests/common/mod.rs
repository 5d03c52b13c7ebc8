#![allow(dead_code)]

use solana_program::{
    instruction::{AccountMeta, Instruction, InstructionError},
    program_pack::Pack,
    pubkey::Pubkey,
};
use solana_program_test::*;
use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    native_token::LAMPORTS_PER_SOL,
    signature::{Keypair, Signer},
    system_instruction,
    sysvar::clock::Clock,
    transaction::{Transaction, TransactionError},
};

use std::sync::atomic::{AtomicU32, Ordering};

use vrf_raffle::{
    config::{NetworkConfig, BASE_FEE, GAS_PRICE_LINK, VRF_SUB_FUND_AMOUNT},
    coordinator::{
        self,
        instruction as coordinator_instruction,
        state::{AccountState, CoordinatorState, RandomWordsRequest, Subscription},
    },
    instruction,
    state::{Raffle, RaffleConfig},
    utils,
};

/// A local cluster with the mock coordinator deployed, subscription 1 funded
/// and a raffle registered as its consumer
pub struct TestEnv {
    pub context: ProgramTestContext,
    pub raffle_program: Pubkey,
    pub coordinator_program: Pubkey,
    pub raffle: Pubkey,
    pub sub_id: u64,
    pub config: RaffleConfig,
}

pub async fn setup() -> TestEnv {
    let raffle_program = Pubkey::new_unique();
    let coordinator_program = Pubkey::new_unique();

    let mut program_test = ProgramTest::new(
        "vrf_raffle",
        raffle_program,
        processor!(vrf_raffle::process_instruction),
    );
    program_test.add_program(
        "vrf_coordinator",
        coordinator_program,
        processor!(coordinator::processor::process_instruction),
    );
    program_test.prefer_bpf(false);

    let mut context = program_test.start_with_context().await;
    let payer = context.payer.insecure_clone();

    process(
        &mut context,
        &[
            coordinator_instruction::initialize(
                &coordinator_program,
                &payer.pubkey(),
                BASE_FEE,
                GAS_PRICE_LINK,
            )
            .unwrap(),
            coordinator_instruction::create_subscription(&coordinator_program, &payer.pubkey(), 1)
                .unwrap(),
            coordinator_instruction::fund_subscription(
                &coordinator_program,
                &payer.pubkey(),
                1,
                VRF_SUB_FUND_AMOUNT,
            )
            .unwrap(),
        ],
        &[],
    )
    .await
    .unwrap();

    let network = NetworkConfig::for_cluster("localnet").unwrap();
    let config = RaffleConfig::from_network(&network, coordinator_program, 1);

    let mut env = TestEnv {
        context,
        raffle_program,
        coordinator_program,
        raffle: Pubkey::default(),
        sub_id: 1,
        config,
    };
    let raffle = env.create_raffle(&payer, 1).await;
    env.add_consumer(1, &raffle).await.unwrap();
    env.raffle = raffle;
    env
}

static NONCE: AtomicU32 = AtomicU32::new(0);

/// Sends `instructions` in a transaction paid by the context payer.
///
/// A trailing compute limit makes every message unique, so a retried
/// instruction is executed again instead of being reported as already processed.
pub async fn process(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let blockhash = context.banks_client.get_latest_blockhash().await.unwrap();
    let payer = context.payer.insecure_clone();

    let mut keypairs = vec![&payer];
    keypairs.extend(
        signers
            .iter()
            .copied()
            .filter(|signer| signer.pubkey() != payer.pubkey()),
    );

    let nonce = NONCE.fetch_add(1, Ordering::Relaxed);
    let mut instructions = instructions.to_vec();
    instructions.push(ComputeBudgetInstruction::set_compute_unit_limit(
        1_400_000 - nonce,
    ));

    let mut transaction = Transaction::new_with_payer(&instructions, Some(&payer.pubkey()));
    transaction.sign(&keypairs, blockhash);
    context.banks_client.process_transaction(transaction).await
}

pub fn custom_error(code: u32) -> TransactionError {
    TransactionError::InstructionError(0, InstructionError::Custom(code))
}

impl TestEnv {
    pub fn payer(&self) -> Keypair {
        self.context.payer.insecure_clone()
    }

    pub async fn create_raffle(&mut self, authority: &Keypair, sub_id: u64) -> Pubkey {
        let (raffle, _) = utils::find_raffle_address(&self.raffle_program, &authority.pubkey());
        let ix = instruction::initialize(
            &self.raffle_program,
            &authority.pubkey(),
            &self.coordinator_program,
            self.config.entrance_fee,
            self.config.gas_lane,
            sub_id,
            self.config.callback_gas_limit,
            self.config.interval,
        )
        .unwrap();
        process(&mut self.context, &[ix], &[authority]).await.unwrap();
        raffle
    }

    pub async fn create_subscription(&mut self) -> u64 {
        let sub_id = self.coordinator_state().await.current_sub_id + 1;
        let payer = self.payer();
        let ix = coordinator_instruction::create_subscription(
            &self.coordinator_program,
            &payer.pubkey(),
            sub_id,
        )
        .unwrap();
        process(&mut self.context, &[ix], &[]).await.unwrap();
        sub_id
    }

    pub async fn add_consumer(&mut self, sub_id: u64, consumer: &Pubkey) -> Result<(), BanksClientError> {
        let payer = self.payer();
        let ix = coordinator_instruction::add_consumer(
            &self.coordinator_program,
            &payer.pubkey(),
            sub_id,
            consumer,
        )
        .unwrap();
        process(&mut self.context, &[ix], &[]).await
    }

    /// A fresh keypair holding `sol` SOL
    pub async fn funded_keypair(&mut self, sol: u64) -> Keypair {
        let keypair = Keypair::new();
        let payer = self.payer();
        let ix = system_instruction::transfer(&payer.pubkey(), &keypair.pubkey(), sol * LAMPORTS_PER_SOL);
        process(&mut self.context, &[ix], &[]).await.unwrap();
        keypair
    }

    pub async fn enter(&mut self, raffle: &Pubkey, player: &Keypair, amount: u64) -> Result<(), BanksClientError> {
        let ix = instruction::enter(&self.raffle_program, &player.pubkey(), raffle, amount).unwrap();
        process(&mut self.context, &[ix], &[player]).await
    }

    /// Enters `count` new players paying exactly the entrance fee
    pub async fn enter_players(&mut self, count: usize) -> Vec<Keypair> {
        let mut players = Vec::with_capacity(count);
        for _ in 0..count {
            let player = self.funded_keypair(1).await;
            let raffle = self.raffle;
            let fee = self.config.entrance_fee;
            self.enter(&raffle, &player, fee).await.unwrap();
            players.push(player);
        }
        players
    }

    /// Simulates `CheckUpkeep` and decodes its return data
    pub async fn check_upkeep(&mut self, raffle: &Pubkey) -> bool {
        let ix = instruction::check_upkeep(&self.raffle_program, raffle).unwrap();
        let payer = self.payer();
        let blockhash = self.context.banks_client.get_latest_blockhash().await.unwrap();
        let transaction =
            Transaction::new_signed_with_payer(&[ix], Some(&payer.pubkey()), &[&payer], blockhash);

        let simulation = self
            .context
            .banks_client
            .simulate_transaction(transaction)
            .await
            .unwrap();
        assert!(matches!(simulation.result, Some(Ok(()))));

        // The runtime trims trailing zeros, so `false` comes back as no data at all
        simulation
            .simulation_details
            .and_then(|details| details.return_data)
            .map(|return_data| {
                assert_eq!(return_data.program_id, self.raffle_program);
                return_data.data.first() == Some(&1)
            })
            .unwrap_or(false)
    }

    pub async fn perform_upkeep(&mut self, raffle: &Pubkey, sub_id: u64) -> Result<u64, BanksClientError> {
        let request_id = self.coordinator_state().await.request_counter + 1;
        let payer = self.payer();
        let ix = instruction::perform_upkeep(
            &self.raffle_program,
            &payer.pubkey(),
            raffle,
            &self.coordinator_program,
            sub_id,
            request_id,
        )
        .unwrap();
        process(&mut self.context, &[ix], &[]).await?;
        Ok(request_id)
    }

    pub async fn fulfill(
        &mut self,
        raffle: &Pubkey,
        sub_id: u64,
        request_id: u64,
        winner: &Pubkey,
        random_words_override: Vec<u64>,
    ) -> Result<(), BanksClientError> {
        let payer = self.payer();
        let ix = coordinator_instruction::fulfill_random_words(
            &self.coordinator_program,
            &payer.pubkey(),
            sub_id,
            request_id,
            &self.raffle_program,
            raffle,
            &[AccountMeta::new(*winner, false)],
            random_words_override,
        )
        .unwrap();
        process(&mut self.context, &[ix], &[]).await
    }

    pub async fn advance_clock(&mut self, seconds: i64) {
        let mut clock: Clock = self.context.banks_client.get_sysvar().await.unwrap();
        clock.unix_timestamp += seconds;
        self.context.set_sysvar(&clock);
    }

    /// Moves time just past the draw interval
    pub async fn pass_interval(&mut self) {
        let interval = self.config.interval as i64;
        self.advance_clock(interval + 1).await;
    }

    pub async fn raffle_state(&mut self, raffle: &Pubkey) -> Raffle {
        let account = self
            .context
            .banks_client
            .get_account(*raffle)
            .await
            .unwrap()
            .unwrap();
        Raffle::unpack(&account.data).unwrap()
    }

    pub async fn coordinator_state(&mut self) -> CoordinatorState {
        let (address, _) = utils::find_coordinator_address(&self.coordinator_program);
        let account = self.context.banks_client.get_account(address).await.unwrap().unwrap();
        CoordinatorState::load(&account.data).unwrap()
    }

    pub async fn subscription(&mut self, sub_id: u64) -> Subscription {
        let (address, _) = utils::find_subscription_address(&self.coordinator_program, sub_id);
        let account = self.context.banks_client.get_account(address).await.unwrap().unwrap();
        Subscription::load(&account.data).unwrap()
    }

    pub async fn request(&mut self, request_id: u64) -> Option<RandomWordsRequest> {
        let (address, _) = utils::find_request_address(&self.coordinator_program, request_id);
        self.context
            .banks_client
            .get_account(address)
            .await
            .unwrap()
            .and_then(|account| RandomWordsRequest::load(&account.data).ok())
    }

    pub async fn balance(&mut self, address: &Pubkey) -> u64 {
        self.context.banks_client.get_balance(*address).await.unwrap()
    }

    /// Lamports the raffle holds above its rent reserve
    pub async fn pot(&mut self, raffle: &Pubkey) -> u64 {
        let rent = self.context.banks_client.get_rent().await.unwrap();
        self.balance(raffle).await - rent.minimum_balance(Raffle::LEN)
    }
}
