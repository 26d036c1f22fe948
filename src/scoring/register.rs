use super::bands::Bands;
use super::error::ScoringError;
use super::tier::Tier;

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

/// Register tiers over likelihood × impact, inclusive on both ends.
pub const REGISTER_BANDS: Bands<Tier> = Bands::new(
    1,
    &[
        (5, Tier::Low),
        (11, Tier::Medium),
        (19, Tier::High),
        (25, Tier::Critical),
    ],
);

/// Score a risk as likelihood × impact and map it to its tier.
pub fn classify(likelihood: u8, impact: u8) -> Result<(u8, Tier), ScoringError> {
    check_rating("likelihood", likelihood)?;
    check_rating("impact", impact)?;

    let score = likelihood * impact;
    let tier = REGISTER_BANDS
        .classify(score as u32)
        .ok_or(ScoringError::Unbanded { score: score as u32 })?;
    Ok((score, tier))
}

fn check_rating(field: &'static str, value: u8) -> Result<(), ScoringError> {
    if (MIN_RATING..=MAX_RATING).contains(&value) {
        Ok(())
    } else {
        Err(ScoringError::InvalidInput {
            field,
            value: value as u32,
            min: MIN_RATING as u32,
            max: MAX_RATING as u32,
        })
    }
}
