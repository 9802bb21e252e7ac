pub mod common;

mod token_cache_tiers;
