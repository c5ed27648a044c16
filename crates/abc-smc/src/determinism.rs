use abc_core::derive_substream_seed;

const INIT_STREAM: u64 = 0x1A17_0000_0000_0000;
const RESAMPLE_SALT: u64 = 0xA5A5_A5A5_A5A5_A5A5;
const FINAL_SALT: u64 = 0x5A5A_5A5A_5A5A_5A5A;

/// Seed for the prior draws of the initial population.
pub fn init_seed(master_seed: u64) -> u64 {
    derive_substream_seed(master_seed, INIT_STREAM)
}

/// Seed for one chain's mutation during a stage.
pub fn chain_seed(master_seed: u64, stage: usize, chain: usize) -> u64 {
    let intermediate = derive_substream_seed(master_seed, (stage as u64) << 32 | 0xC4A1);
    derive_substream_seed(intermediate, chain as u64)
}

/// Seed for the systematic resampling offset of a stage.
pub fn resample_seed(master_seed: u64, stage: usize) -> u64 {
    derive_substream_seed(master_seed ^ RESAMPLE_SALT, stage as u64)
}

/// Seed for the ancestor draws of the final stage.
pub fn final_draw_seed(master_seed: u64) -> u64 {
    derive_substream_seed(master_seed ^ FINAL_SALT, u64::MAX)
}

/// Seed for the final mutation of one posterior draw.
pub fn final_chain_seed(master_seed: u64, draw: usize) -> u64 {
    derive_substream_seed(master_seed ^ FINAL_SALT, draw as u64)
}

/// Seed for refilling final draws that never met the floor.
pub fn final_refill_seed(master_seed: u64) -> u64 {
    derive_substream_seed(master_seed ^ FINAL_SALT, u64::MAX - 1)
}
