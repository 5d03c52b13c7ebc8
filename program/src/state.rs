use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use solana_program::{
    clock::UnixTimestamp,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::{error::RaffleError, vrf};

/// Maximum number of entrants a single round can hold
pub const MAX_PLAYERS: usize = 64;

/// Block confirmations the coordinator waits before answering
pub const REQUEST_CONFIRMATIONS: u16 = 3;

/// Random words requested per round
pub const NUM_WORDS: u32 = 1;

const PLAYERS_LEN: usize = 32 * MAX_PLAYERS;

/// Lifecycle state of a raffle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entrants
    Open,
    /// Waiting on the coordinator callback
    Calculating,
}

impl TryFrom<u8> for RaffleState {
    type Error = ProgramError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(RaffleState::Open),
            1 => Ok(RaffleState::Calculating),
            _ => Err(ProgramError::InvalidAccountData),
        }
    }
}

impl From<RaffleState> for u8 {
    fn from(state: RaffleState) -> Self {
        match state {
            RaffleState::Open => 0,
            RaffleState::Calculating => 1,
        }
    }
}

/// Immutable parameters fixed when the raffle is initialized
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RaffleConfig {
    /// Program id of the VRF coordinator serving this raffle
    pub coordinator: Pubkey,
    /// Minimum entrance payment in lamports
    pub entrance_fee: u64,
    /// Key hash selecting the coordinator's gas lane
    pub gas_lane: [u8; 32],
    /// Coordinator subscription paying for callbacks
    pub subscription_id: u64,
    /// Confirmations requested from the coordinator
    pub request_confirmations: u16,
    /// Compute budget granted to the fulfillment callback
    pub callback_gas_limit: u32,
    /// Minimum seconds between round resets and the next draw
    pub interval: u64,
}

impl RaffleConfig {
    pub const LEN: usize = 32 + 8 + 32 + 8 + 2 + 4 + 8;

    fn unpack_from(src: &[u8; RaffleConfig::LEN]) -> Self {
        let (
            coordinator,
            entrance_fee,
            gas_lane,
            subscription_id,
            request_confirmations,
            callback_gas_limit,
            interval,
        ) = array_refs![src, 32, 8, 32, 8, 2, 4, 8];

        RaffleConfig {
            coordinator: Pubkey::new_from_array(*coordinator),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            gas_lane: *gas_lane,
            subscription_id: u64::from_le_bytes(*subscription_id),
            request_confirmations: u16::from_le_bytes(*request_confirmations),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            interval: u64::from_le_bytes(*interval),
        }
    }

    fn pack_into(&self, dst: &mut [u8; RaffleConfig::LEN]) {
        let (
            coordinator_dst,
            entrance_fee_dst,
            gas_lane_dst,
            subscription_id_dst,
            request_confirmations_dst,
            callback_gas_limit_dst,
            interval_dst,
        ) = mut_array_refs![dst, 32, 8, 32, 8, 2, 4, 8];

        coordinator_dst.copy_from_slice(self.coordinator.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *gas_lane_dst = self.gas_lane;
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *request_confirmations_dst = self.request_confirmations.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
    }
}

/// Snapshot of the upkeep predicate and the values it was computed from
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UpkeepStatus {
    pub upkeep_needed: bool,
    pub balance: u64,
    pub player_count: u64,
    pub state: RaffleState,
    pub time_passed: bool,
}

/// Raffle account data
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Bump of the raffle PDA
    pub bump: u8,
    /// Deployer of the raffle, part of the PDA seeds
    pub authority: Pubkey,
    pub config: RaffleConfig,
    pub state: RaffleState,
    /// Time of construction or of the last completed round
    pub last_timestamp: UnixTimestamp,
    pub recent_winner: Option<Pubkey>,
    /// Entrants of the current round in entry order
    pub players: Vec<Pubkey>,
}

impl Raffle {
    pub fn new(authority: Pubkey, bump: u8, config: RaffleConfig, now: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            bump,
            authority,
            config,
            state: RaffleState::Open,
            last_timestamp: now,
            recent_winner: None,
            players: Vec::new(),
        }
    }

    /// Records `player` as an entrant of the current round.
    ///
    /// The payment is checked before the state, so an underpaying entrant is
    /// told about the fee even while a winner is being calculated.
    pub fn enter(&mut self, player: Pubkey, amount: u64) -> Result<(), RaffleError> {
        if amount < self.config.entrance_fee {
            return Err(RaffleError::InsufficientPayment);
        }
        if self.state != RaffleState::Open {
            return Err(RaffleError::RaffleNotOpen);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(RaffleError::RaffleFull);
        }
        self.players.push(player);
        Ok(())
    }

    pub fn upkeep_status(&self, now: UnixTimestamp, balance: u64) -> UpkeepStatus {
        let elapsed = now.saturating_sub(self.last_timestamp);
        let time_passed = u64::try_from(elapsed)
            .map(|elapsed| elapsed >= self.config.interval)
            .unwrap_or(false);
        let is_open = self.state == RaffleState::Open;
        let has_players = !self.players.is_empty();
        let has_balance = balance > 0;

        UpkeepStatus {
            upkeep_needed: is_open && time_passed && has_players && has_balance,
            balance,
            player_count: self.players.len() as u64,
            state: self.state,
            time_passed,
        }
    }

    /// True when the keeper should trigger a draw.
    pub fn check_upkeep(&self, now: UnixTimestamp, balance: u64) -> bool {
        self.upkeep_status(now, balance).upkeep_needed
    }

    /// Moves the raffle into `Calculating` if the upkeep predicate holds right now.
    /// On refusal the diagnostic snapshot is handed back to the caller.
    pub fn begin_calculating(
        &mut self,
        now: UnixTimestamp,
        balance: u64,
    ) -> Result<UpkeepStatus, UpkeepStatus> {
        let status = self.upkeep_status(now, balance);
        if !status.upkeep_needed {
            return Err(status);
        }
        self.state = RaffleState::Calculating;
        Ok(status)
    }

    /// Picks the winner from the first random word and resets the round.
    pub fn settle(&mut self, random_words: &[u64], now: UnixTimestamp) -> Result<Pubkey, RaffleError> {
        if self.state != RaffleState::Calculating {
            return Err(RaffleError::RaffleNotCalculating);
        }
        let word = random_words.first().ok_or(RaffleError::NoRandomWords)?;
        let index = vrf::winner_index(*word, self.players.len());
        let winner = *self
            .players
            .get(index)
            .ok_or(RaffleError::PlayerIndexOutOfRange)?;

        self.recent_winner = Some(winner);
        self.players.clear();
        self.state = RaffleState::Open;
        self.last_timestamp = now;
        Ok(winner)
    }

    pub fn state(&self) -> RaffleState {
        self.state
    }

    pub fn entrance_fee(&self) -> u64 {
        self.config.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.config.interval
    }

    pub fn player(&self, index: usize) -> Option<Pubkey> {
        self.players.get(index).copied()
    }

    pub fn number_of_players(&self) -> usize {
        self.players.len()
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.recent_winner
    }

    pub fn last_timestamp(&self) -> UnixTimestamp {
        self.last_timestamp
    }

    pub fn request_confirmations(&self) -> u16 {
        self.config.request_confirmations
    }

    pub fn num_words(&self) -> u32 {
        NUM_WORDS
    }
}

impl Sealed for Raffle {}

impl IsInitialized for Raffle {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Raffle {
    const LEN: usize = 1 + 1 + 32 + RaffleConfig::LEN + 1 + 8 + 33 + 4 + PLAYERS_LEN;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Raffle::LEN];
        let (
            is_initialized,
            bump,
            authority,
            config,
            state,
            last_timestamp,
            recent_winner,
            player_count,
            players,
        ) = array_refs![src, 1, 1, 32, RaffleConfig::LEN, 1, 8, 33, 4, PLAYERS_LEN];

        let is_initialized = match is_initialized[0] {
            0 => false,
            1 => true,
            _ => return Err(ProgramError::InvalidAccountData),
        };

        let (winner_tag, winner_key) = array_refs![recent_winner, 1, 32];
        let recent_winner = match winner_tag[0] {
            0 => None,
            1 => Some(Pubkey::new_from_array(*winner_key)),
            _ => return Err(ProgramError::InvalidAccountData),
        };

        let player_count = u32::from_le_bytes(*player_count) as usize;
        if player_count > MAX_PLAYERS {
            return Err(ProgramError::InvalidAccountData);
        }
        let players = players
            .chunks_exact(32)
            .take(player_count)
            .map(|chunk| Pubkey::new_from_array(*array_ref![chunk, 0, 32]))
            .collect();

        Ok(Raffle {
            is_initialized,
            bump: bump[0],
            authority: Pubkey::new_from_array(*authority),
            config: RaffleConfig::unpack_from(config),
            state: RaffleState::try_from(state[0])?,
            last_timestamp: UnixTimestamp::from_le_bytes(*last_timestamp),
            recent_winner,
            players,
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Raffle::LEN];
        let (
            is_initialized_dst,
            bump_dst,
            authority_dst,
            config_dst,
            state_dst,
            last_timestamp_dst,
            recent_winner_dst,
            player_count_dst,
            players_dst,
        ) = mut_array_refs![dst, 1, 1, 32, RaffleConfig::LEN, 1, 8, 33, 4, PLAYERS_LEN];

        is_initialized_dst[0] = self.is_initialized as u8;
        bump_dst[0] = self.bump;
        authority_dst.copy_from_slice(self.authority.as_ref());
        self.config.pack_into(config_dst);
        state_dst[0] = self.state.into();
        *last_timestamp_dst = self.last_timestamp.to_le_bytes();

        let (winner_tag_dst, winner_key_dst) = mut_array_refs![recent_winner_dst, 1, 32];
        match self.recent_winner {
            Some(winner) => {
                winner_tag_dst[0] = 1;
                winner_key_dst.copy_from_slice(winner.as_ref());
            }
            None => {
                winner_tag_dst[0] = 0;
                winner_key_dst.fill(0);
            }
        }

        *player_count_dst = (self.players.len() as u32).to_le_bytes();
        players_dst.fill(0);
        for (chunk, player) in players_dst.chunks_exact_mut(32).zip(self.players.iter()) {
            chunk.copy_from_slice(player.as_ref());
        }
    }
}
