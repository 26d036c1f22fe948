use super::config::ScoringConfig;

/// Validate scoring configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_scoring(config: &ScoringConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if let Some(days) = config.due_soon_days {
        if days < 0 {
            errors.push(format!("scoring.due_soon_days: must be non-negative, got {}", days));
        }
    }

    if config.top_n == Some(0) {
        errors.push("scoring.top_n: must be at least 1".to_string());
    }

    if let Some(days) = config.pen_test_max_age_days {
        if days <= 0 {
            errors.push(format!(
                "scoring.pen_test_max_age_days: must be positive, got {}",
                days
            ));
        }
    }

    // The same location cannot be both approved and high-risk
    let policy = config.jurisdiction_policy();
    for location in &policy.approved {
        if policy.high_risk.contains(location) {
            errors.push(format!(
                "scoring: hosting location '{:?}' is listed as both approved and high-risk",
                location
            ));
        }
    }

    if let Some(ref names) = config.high_risk_jurisdictions {
        for (i, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                errors.push(format!("scoring.high_risk_jurisdictions[{}]: must not be empty", i));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
