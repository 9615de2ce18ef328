use bytes::Bytes;
use serde::{de::DeserializeOwned, Serialize};
use tracing::warn;

use crate::domain::{
    EmailLog, FamilyProfile, GroceryItem, IdentifiedFood, InventoryItem, MealPlanDay, Recipe,
    WarrantyAsset, WasteRecord,
};
use crate::store::KvStore;

/// Storage-key prefix for a user: the email with every non-alphanumeric
/// character stripped, plus a trailing underscore. Namespace separation
/// between users comes entirely from this prefix.
pub fn key_prefix(email: &str) -> String {
    let mut prefix: String = email.chars().filter(|c| c.is_ascii_alphanumeric()).collect();
    prefix.push('_');
    prefix
}

const KEY_INVENTORY: &str = "inventory";
const KEY_FOOD: &str = "food";
const KEY_VAULT: &str = "vault";
const KEY_WASTE: &str = "waste";
const KEY_MEALPLAN: &str = "mealplan";
const KEY_RECIPES: &str = "recipes";
const KEY_GROCERIES: &str = "groceries";
const KEY_EMAILS: &str = "emails";
const KEY_PROFILE: &str = "profile";

/// Session lifecycle. Saves are only valid once the session is Ready;
/// anything earlier would overwrite persisted data with empty defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Loaded,
    Ready,
}

/// A user's nine collections, loaded as a unit and saved full-replace.
pub struct Session {
    prefix: String,
    phase: Phase,
    pub inventory: Vec<InventoryItem>,
    pub food_monitor: Vec<IdentifiedFood>,
    pub asset_vault: Vec<WarrantyAsset>,
    pub waste_history: Vec<WasteRecord>,
    pub meal_plan: Vec<MealPlanDay>,
    pub recipes: Vec<Recipe>,
    pub grocery_list: Vec<GroceryItem>,
    pub email_logs: Vec<EmailLog>,
    pub profile: FamilyProfile,
}

impl Session {
    /// Loads every collection for the user, substituting defaults for
    /// missing or malformed blobs, and only then becomes Ready.
    pub async fn open(store: &dyn KvStore, email: &str) -> anyhow::Result<Self> {
        let prefix = key_prefix(email);
        let mut session = Self {
            prefix,
            phase: Phase::Uninitialized,
            inventory: Vec::new(),
            food_monitor: Vec::new(),
            asset_vault: Vec::new(),
            waste_history: Vec::new(),
            meal_plan: Vec::new(),
            recipes: Vec::new(),
            grocery_list: Vec::new(),
            email_logs: Vec::new(),
            profile: FamilyProfile::default_for(email),
        };

        session.inventory = session.load(store, KEY_INVENTORY, Vec::new).await?;
        session.food_monitor = session.load(store, KEY_FOOD, Vec::new).await?;
        session.asset_vault = session.load(store, KEY_VAULT, Vec::new).await?;
        session.waste_history = session.load(store, KEY_WASTE, Vec::new).await?;
        session.meal_plan = session.load(store, KEY_MEALPLAN, Vec::new).await?;
        session.recipes = session.load(store, KEY_RECIPES, Vec::new).await?;
        session.grocery_list = session.load(store, KEY_GROCERIES, Vec::new).await?;
        session.email_logs = session.load(store, KEY_EMAILS, Vec::new).await?;
        session.profile = session
            .load(store, KEY_PROFILE, || FamilyProfile::default_for(email))
            .await?;
        session.phase = Phase::Loaded;
        session.mark_ready();
        Ok(session)
    }

    fn mark_ready(&mut self) {
        debug_assert_eq!(self.phase, Phase::Loaded);
        self.phase = Phase::Ready;
    }

    async fn load<T, F>(&self, store: &dyn KvStore, key: &str, default: F) -> anyhow::Result<T>
    where
        T: DeserializeOwned,
        F: FnOnce() -> T,
    {
        let full_key = format!("{}{}", self.prefix, key);
        match store.get(&full_key).await? {
            Some(raw) => match serde_json::from_slice(&raw) {
                Ok(value) => Ok(value),
                Err(e) => {
                    // Malformed blob is recovered locally, never surfaced.
                    warn!(key = %full_key, error = %e, "malformed stored blob, using defaults");
                    Ok(default())
                }
            },
            None => Ok(default()),
        }
    }

    async fn save<T: Serialize>(
        &self,
        store: &dyn KvStore,
        key: &str,
        value: &T,
    ) -> anyhow::Result<()> {
        if self.phase != Phase::Ready {
            anyhow::bail!("session not ready, refusing to save {key}");
        }
        let full_key = format!("{}{}", self.prefix, key);
        let raw = serde_json::to_vec(value)?;
        store.put(&full_key, Bytes::from(raw)).await
    }

    /// Overwrites every collection key with the in-memory state.
    pub async fn save_all(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_INVENTORY, &self.inventory).await?;
        self.save(store, KEY_FOOD, &self.food_monitor).await?;
        self.save(store, KEY_VAULT, &self.asset_vault).await?;
        self.save(store, KEY_WASTE, &self.waste_history).await?;
        self.save(store, KEY_MEALPLAN, &self.meal_plan).await?;
        self.save(store, KEY_RECIPES, &self.recipes).await?;
        self.save(store, KEY_GROCERIES, &self.grocery_list).await?;
        self.save(store, KEY_EMAILS, &self.email_logs).await?;
        self.save(store, KEY_PROFILE, &self.profile).await
    }

    pub async fn save_inventory(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_INVENTORY, &self.inventory).await
    }

    pub async fn save_food_monitor(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_FOOD, &self.food_monitor).await
    }

    pub async fn save_asset_vault(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_VAULT, &self.asset_vault).await
    }

    pub async fn save_waste_history(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_WASTE, &self.waste_history).await
    }

    pub async fn save_meal_plan(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_MEALPLAN, &self.meal_plan).await
    }

    pub async fn save_recipes(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_RECIPES, &self.recipes).await
    }

    pub async fn save_grocery_list(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_GROCERIES, &self.grocery_list).await
    }

    pub async fn save_email_logs(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_EMAILS, &self.email_logs).await
    }

    pub async fn save_profile(&self, store: &dyn KvStore) -> anyhow::Result<()> {
        self.save(store, KEY_PROFILE, &self.profile).await
    }
}
