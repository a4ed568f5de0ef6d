//! Level reward claims
//!
//! Completing a level can pay out tokens through an external rewards
//! service. The game only builds the request from its final score and
//! reports the outcome; nothing here feeds back into the simulation.

use std::collections::{HashMap, HashSet};

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum score to claim a level reward
pub const MIN_CLAIM_SCORE: u64 = 50;

/// Highest level the service accepts
pub const MAX_CLAIM_LEVEL: u32 = 100;

/// Tokens shown for levels without a table entry
pub const DEFAULT_LEVEL_REWARD: u64 = 10;

/// Claims per address allowed inside one rate-limit window
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 10;
pub const RATE_LIMIT_WINDOW_MS: u64 = 60_000;

/// Token payout per level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelReward {
    pub level: u32,
    pub amount: u64,
}

pub const LEVEL_REWARDS: &[LevelReward] = &[
    LevelReward { level: 1, amount: 10 },
    LevelReward { level: 2, amount: 20 },
    LevelReward { level: 3, amount: 30 },
    LevelReward { level: 4, amount: 50 },
    LevelReward { level: 5, amount: 100 },
];

/// Reward displayed for a level (falls back to the default amount)
pub fn reward_for_level(level: u32) -> u64 {
    LEVEL_REWARDS
        .iter()
        .find(|r| r.level == level)
        .map(|r| r.amount)
        .unwrap_or(DEFAULT_LEVEL_REWARD)
}

pub fn score_qualifies(score: u64) -> bool {
    score >= MIN_CLAIM_SCORE
}

/// `0x` followed by 40 hex digits
pub fn is_valid_address(address: &str) -> bool {
    address
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardsError {
    #[error("level is not complete")]
    LevelNotComplete,
    #[error("score must be at least {min} to claim a reward (got {0})", min = MIN_CLAIM_SCORE)]
    ScoreTooLow(u64),
    #[error("wallet not connected")]
    WalletNotConnected,
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),
    #[error("invalid level {0} (must be 1-{max})", max = MAX_CLAIM_LEVEL)]
    InvalidLevel(u32),
    #[error("level {level} reward already claimed")]
    AlreadyClaimed { level: u32 },
    #[error("no reward configured for level {level}")]
    NoRewardConfigured { level: u32 },
    #[error("too many requests, try again later")]
    RateLimited,
    #[error("rewards service: {0}")]
    Transport(String),
}

/// A validated claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequest {
    pub address: String,
    pub level: u32,
    pub score: u64,
}

impl ClaimRequest {
    /// Check everything the client can check before calling the service
    pub fn new(address: Option<&str>, level: u32, score: u64) -> Result<Self, RewardsError> {
        if !score_qualifies(score) {
            return Err(RewardsError::ScoreTooLow(score));
        }
        let address = address.ok_or(RewardsError::WalletNotConnected)?;
        if !is_valid_address(address) {
            return Err(RewardsError::InvalidAddress(address.to_string()));
        }
        if level == 0 || level > MAX_CLAIM_LEVEL {
            return Err(RewardsError::InvalidLevel(level));
        }
        Ok(Self {
            address: address.to_string(),
            level,
            score,
        })
    }
}

/// Successful payout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub tx_hash: String,
    pub reward_amount: u64,
    pub level: u32,
    pub score: u64,
}

/// The external service that pays level rewards
pub trait RewardsService {
    fn claim_level_reward(&mut self, request: &ClaimRequest) -> Result<ClaimReceipt, RewardsError>;
}

/// In-memory rewards service for headless play and tests
#[derive(Debug, Clone)]
pub struct MockRewards {
    claimed: HashSet<(String, u32)>,
    rate: HashMap<String, (u32, u64)>,
    now_ms: u64,
    rng: Pcg32,
}

impl Default for MockRewards {
    fn default() -> Self {
        Self::with_seed(0)
    }
}

impl MockRewards {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            claimed: HashSet::new(),
            rate: HashMap::new(),
            now_ms: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Set the clock used for rate limiting
    pub fn set_now_ms(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn has_claimed(&self, address: &str, level: u32) -> bool {
        self.claimed
            .contains(&(address.to_ascii_lowercase(), level))
    }

    fn check_rate_limit(&mut self, address: &str) -> bool {
        let now = self.now_ms;
        let entry = self.rate.entry(address.to_string()).or_insert((0, now));
        if now.saturating_sub(entry.1) > RATE_LIMIT_WINDOW_MS {
            *entry = (0, now);
        }
        if entry.0 >= RATE_LIMIT_MAX_REQUESTS {
            return false;
        }
        entry.0 += 1;
        true
    }

    fn tx_hash(&mut self) -> String {
        let mut hash = String::with_capacity(66);
        hash.push_str("0x");
        for _ in 0..4 {
            hash.push_str(&format!("{:016x}", self.rng.random::<u64>()));
        }
        hash
    }
}

impl RewardsService for MockRewards {
    fn claim_level_reward(&mut self, request: &ClaimRequest) -> Result<ClaimReceipt, RewardsError> {
        let address = request.address.to_ascii_lowercase();
        if !self.check_rate_limit(&address) {
            return Err(RewardsError::RateLimited);
        }
        if self.claimed.contains(&(address.clone(), request.level)) {
            return Err(RewardsError::AlreadyClaimed {
                level: request.level,
            });
        }
        let reward_amount = LEVEL_REWARDS
            .iter()
            .find(|r| r.level == request.level)
            .map(|r| r.amount)
            .ok_or(RewardsError::NoRewardConfigured {
                level: request.level,
            })?;

        self.claimed.insert((address, request.level));
        let tx_hash = self.tx_hash();
        log::debug!("Mock reward paid: level {} -> {}", request.level, tx_hash);
        Ok(ClaimReceipt {
            tx_hash,
            reward_amount,
            level: request.level,
            score: request.score,
        })
    }
}
