// Address derivation, account creation and unit helpers shared by both programs
use solana_program::{
    account_info::AccountInfo,
    entrypoint::ProgramResult,
    program::invoke_signed,
    program_error::ProgramError,
    pubkey::Pubkey,
    rent::Rent,
    system_instruction,
    sysvar::Sysvar,
};

pub const RAFFLE_SEED: &[u8] = b"raffle";
pub const COORDINATOR_SEED: &[u8] = b"coordinator";
pub const SUBSCRIPTION_SEED: &[u8] = b"subscription";
pub const REQUEST_SEED: &[u8] = b"request";

const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

/// Find the raffle PDA owned by `authority`
pub fn find_raffle_address(program_id: &Pubkey, authority: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[RAFFLE_SEED, authority.as_ref()], program_id)
}

/// Find the coordinator state PDA, which also signs fulfillment callbacks
pub fn find_coordinator_address(coordinator_program: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[COORDINATOR_SEED], coordinator_program)
}

/// Find the PDA of a coordinator subscription
pub fn find_subscription_address(coordinator_program: &Pubkey, sub_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[SUBSCRIPTION_SEED, &sub_id.to_le_bytes()],
        coordinator_program,
    )
}

/// Find the PDA of a pending randomness request
pub fn find_request_address(coordinator_program: &Pubkey, request_id: u64) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &[REQUEST_SEED, &request_id.to_le_bytes()],
        coordinator_program,
    )
}

/// Create a rent-exempt PDA of `space` bytes owned by `owner`
pub fn create_pda_account<'a>(
    payer: &AccountInfo<'a>,
    new_account: &AccountInfo<'a>,
    system_program: &AccountInfo<'a>,
    space: usize,
    owner: &Pubkey,
    seeds: &[&[u8]],
) -> ProgramResult {
    let rent = Rent::get()?;
    let rent_lamports = rent.minimum_balance(space);

    invoke_signed(
        &system_instruction::create_account(
            payer.key,
            new_account.key,
            rent_lamports,
            space as u64,
            owner,
        ),
        &[payer.clone(), new_account.clone(), system_program.clone()],
        &[seeds],
    )
}

/// Lamports held by `account` above its rent-exempt minimum
pub fn spendable_lamports(account: &AccountInfo) -> Result<u64, ProgramError> {
    let rent = Rent::get()?;
    Ok(account
        .lamports()
        .saturating_sub(rent.minimum_balance(account.data_len())))
}

/// Convert lamports to SOL (for display purposes)
pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

/// Convert a SOL amount given in thousandths to lamports
pub const fn milli_sol(milli: u64) -> u64 {
    milli * (LAMPORTS_PER_SOL / 1_000)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raffle_address_depends_on_authority() {
        let program_id = Pubkey::new_unique();
        let (a, _) = find_raffle_address(&program_id, &Pubkey::new_unique());
        let (b, _) = find_raffle_address(&program_id, &Pubkey::new_unique());
        assert_ne!(a, b);
    }

    #[test]
    fn unit_conversions() {
        assert_eq!(milli_sol(100), 100_000_000);
        assert_eq!(lamports_to_sol(milli_sol(100)), 0.1);
    }
}
