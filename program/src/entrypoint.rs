// Program entrypoint

use solana_program::{
    account_info::AccountInfo, entrypoint, entrypoint::ProgramResult, msg, pubkey::Pubkey,
};

entrypoint!(process_instruction);

fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    #[cfg(not(feature = "mock-coordinator"))]
    let result = crate::processor::Processor::process(program_id, accounts, instruction_data);
    #[cfg(feature = "mock-coordinator")]
    let result =
        crate::coordinator::processor::Processor::process(program_id, accounts, instruction_data);

    if let Err(error) = &result {
        msg!("Instruction failed: {}", error);
    }
    result
}
