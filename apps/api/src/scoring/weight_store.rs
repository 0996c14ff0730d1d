use tracing::info;

use crate::errors::AppError;
use crate::scoring::weights::{ProfileType, UserWeightConfig, WeightProfile};
use crate::store::MatchStore;

/// Weights submitted through `update` must sum to exactly this value.
pub const REQUIRED_WEIGHT_SUM: u64 = 100;

/// No single category may carry more than this.
pub const MAX_CATEGORY_WEIGHT: u32 = 100;

/// Per-user weight profiles with lazy default seeding.
pub struct WeightStore<'a> {
    store: &'a dyn MatchStore,
}

impl<'a> WeightStore<'a> {
    pub fn new(store: &'a dyn MatchStore) -> Self {
        Self { store }
    }

    /// Seeds the three default profiles if the user has none. No-op otherwise.
    pub async fn initialize(&self, user_id: &str) -> Result<(), AppError> {
        if !self.store.weight_profiles(user_id).await?.is_empty() {
            return Ok(());
        }

        for profile in ProfileType::ALL {
            self.store
                .seed_weight_profile(user_id, profile, &WeightProfile::default_for(profile))
                .await?;
        }
        info!("Seeded default weight profiles for user {user_id}");
        Ok(())
    }

    /// Returns whatever profiles are stored. Absent tiers are simply missing.
    pub async fn get_all(&self, user_id: &str) -> Result<UserWeightConfig, AppError> {
        Ok(self.store.weight_profiles(user_id).await?.into_iter().collect())
    }

    /// Replaces one tier's weights. Never creates a profile.
    pub async fn update(
        &self,
        user_id: &str,
        profile_type: ProfileType,
        weights: WeightProfile,
    ) -> Result<(), AppError> {
        let largest = weights.largest();
        if largest > MAX_CATEGORY_WEIGHT {
            return Err(AppError::Validation(format!(
                "Each weight must be at most {MAX_CATEGORY_WEIGHT} (got {largest})."
            )));
        }

        let sum = weights.sum();
        if sum != REQUIRED_WEIGHT_SUM {
            return Err(AppError::Validation(format!(
                "Weights must sum up to {REQUIRED_WEIGHT_SUM} (got {sum})."
            )));
        }

        if !self
            .store
            .replace_weight_profile(user_id, profile_type, &weights)
            .await?
        {
            return Err(AppError::NotFound(format!(
                "Role '{profile_type}' does not exist for user: {user_id}"
            )));
        }

        info!("Updated '{profile_type}' weights for user {user_id}");
        Ok(())
    }
}
