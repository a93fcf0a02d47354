//! In-process backend.
//!
//! Serves the headless binary's offline mode and the test suite. Holds
//! the same shapes the hosted service returns, joins included, so pages
//! cannot tell the two apart.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::backend::model::*;
use crate::backend::{attachment_object_path, Backend, BackendError, BackendResult};
use crate::dom::SelectedFile;

/// Password shared by the seeded demo accounts.
pub const DEMO_PASSWORD: &str = "password123";

/// Emails of the seeded demo accounts. The first one is an admin.
pub const DEMO_ACCOUNTS: [&str; 3] = ["alice@example.com", "bob@example.com", "carol@example.com"];

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct Store {
    next_id: u64,
    accounts: Vec<Account>,
    admins: HashSet<String>,
    session: Option<Session>,
    strategies: Vec<Strategy>,
    assets: Vec<Asset>,
    lookups: HashMap<LookupTable, Vec<LookupRecord>>,
    attachments: Vec<Attachment>,
    files: HashMap<String, Vec<u8>>,
}

impl Store {
    fn next_id(&mut self) -> String {
        self.next_id += 1;
        self.next_id.to_string()
    }

    fn add_account(&mut self, email: &str, password: &str) -> User {
        let user = User {
            id: self.next_id(),
            email: email.to_string(),
        };
        self.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    fn lookup_name(&self, table: LookupTable, id: Option<&str>) -> Option<NamedRef> {
        let id = id?;
        self.lookups
            .get(&table)?
            .iter()
            .find(|r| r.id == id)
            .and_then(|r| r.name.clone())
            .map(|name| NamedRef { name })
    }

    fn hydrate(&self, asset: &Asset) -> Asset {
        let mut asset = asset.clone();
        asset.target = self.lookup_name(LookupTable::Targets, asset.target_id.as_deref());
        asset.action = self.lookup_name(LookupTable::Actions, asset.action_id.as_deref());
        asset.strategy = self
            .strategies
            .iter()
            .find(|s| s.id == asset.strategy_id)
            .map(|s| StrategyRef {
                id: s.id.clone(),
                title: s.title.clone(),
                owner_id: s.owner_id.clone(),
            });
        asset
    }

    fn owner_of(&self, strategy_id: &str) -> Option<&str> {
        self.strategies
            .iter()
            .find(|s| s.id == strategy_id)
            .map(|s| s.owner_id.as_str())
    }
}

/// Backend kept entirely in memory.
pub struct MemoryBackend {
    store: Mutex<Store>,
    failures: Mutex<HashMap<String, String>>,
    latency: Mutex<Duration>,
}

impl MemoryBackend {
    /// An empty store: no accounts, no lookup rows.
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            failures: Mutex::new(HashMap::new()),
            latency: Mutex::new(Duration::ZERO),
        }
    }

    /// A store with the demo accounts, lookup rows and one strategy.
    pub fn seeded() -> Self {
        let backend = Self::new();
        {
            let mut store = backend.lock();
            seed(&mut store);
        }
        backend
    }

    /// Make every later call of `operation` fail with `message`.
    pub fn fail_operation(&self, operation: &str, message: &str) {
        self.failures
            .lock()
            .expect("failures mutex poisoned")
            .insert(operation.to_string(), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.failures.lock().expect("failures mutex poisoned").clear();
    }

    /// Delay applied before every operation.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().expect("latency mutex poisoned") = latency;
    }

    /// Id of the account registered under `email`.
    pub fn user_id(&self, email: &str) -> Option<String> {
        self.lock()
            .accounts
            .iter()
            .find(|a| a.user.email == email)
            .map(|a| a.user.id.clone())
    }

    /// Grant admin rights to a user.
    pub fn grant_admin(&self, user_id: &str) {
        self.lock().admins.insert(user_id.to_string());
    }

    /// Whether a stored object exists at `path`.
    pub fn has_file(&self, path: &str) -> bool {
        self.lock().files.contains_key(path)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().expect("store mutex poisoned")
    }

    async fn enter(&self, operation: &str) -> BackendResult<()> {
        let latency = *self.latency.lock().expect("latency mutex poisoned");
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let failure = self
            .failures
            .lock()
            .expect("failures mutex poisoned")
            .get(operation)
            .cloned();
        match failure {
            Some(message) => {
                tracing::debug!(operation, message = %message, "Injected backend failure");
                Err(BackendError::Rejected(message))
            }
            None => Ok(()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn seeded_at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 9, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

fn seed(store: &mut Store) {
    let mut users = Vec::new();
    for email in DEMO_ACCOUNTS {
        users.push(store.add_account(email, DEMO_PASSWORD));
    }
    store.admins.insert(users[0].id.clone());

    let rows: [(LookupTable, &[&str]); 4] = [
        (LookupTable::Actions, &["Buy", "Hold", "Sell"]),
        (LookupTable::Exchanges, &["LSE", "NASDAQ", "NYSE"]),
        (LookupTable::Targets, &["Dividend", "Growth", "Value"]),
        (LookupTable::Orders, &["Limit", "Market", "Stop"]),
    ];
    for (table, names) in rows {
        let records = names
            .iter()
            .map(|name| LookupRecord {
                id: store.next_id(),
                name: Some(name.to_string()),
                created_at: Some(seeded_at(1)),
            })
            .collect();
        store.lookups.insert(table, records);
    }

    let strategy = Strategy {
        id: store.next_id(),
        owner_id: users[0].id.clone(),
        title: "Dividend Growth".to_string(),
        description: Some("Blue chips with a rising payout".to_string()),
        created_at: seeded_at(5),
        updated_at: seeded_at(5),
    };

    let dividend = store.lookups[&LookupTable::Targets][0].id.clone();
    let hold = store.lookups[&LookupTable::Actions][1].id.clone();
    for (ticker, name, quantity) in [("MSFT", "Microsoft", 12.0), ("KO", "Coca-Cola", 40.0)] {
        let asset = Asset {
            id: store.next_id(),
            strategy_id: strategy.id.clone(),
            ticker: ticker.to_string(),
            name: name.to_string(),
            exchange: Some("NASDAQ".to_string()),
            quantity,
            target_id: Some(dividend.clone()),
            action_id: Some(hold.clone()),
            target: None,
            action: None,
            strategy: None,
            created_at: seeded_at(6),
        };
        store.assets.push(asset);
    }
    store.strategies.push(strategy);
}

fn newest_first<T>(items: &mut [T], created: impl Fn(&T) -> DateTime<Utc>) {
    items.sort_by_key(|item| std::cmp::Reverse(created(item)));
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn session(&self) -> BackendResult<Option<Session>> {
        self.enter("session").await?;
        Ok(self.lock().session.clone())
    }

    async fn current_user(&self) -> BackendResult<Option<User>> {
        self.enter("current_user").await?;
        Ok(self.lock().session.as_ref().map(|s| s.user.clone()))
    }

    async fn sign_up(&self, email: &str, password: &str) -> BackendResult<User> {
        self.enter("sign_up").await?;
        let mut store = self.lock();
        if store.accounts.iter().any(|a| a.user.email == email) {
            return Err(BackendError::Rejected("User already registered".to_string()));
        }
        if password.len() < 6 {
            return Err(BackendError::Rejected(
                "Password should be at least 6 characters".to_string(),
            ));
        }
        Ok(store.add_account(email, password))
    }

    async fn sign_in(&self, email: &str, password: &str) -> BackendResult<Session> {
        self.enter("sign_in").await?;
        let mut store = self.lock();
        let user = store
            .accounts
            .iter()
            .find(|a| a.user.email == email && a.password == password)
            .map(|a| a.user.clone())
            .ok_or_else(|| BackendError::Rejected("Invalid login credentials".to_string()))?;

        let session = Session {
            access_token: uuid::Uuid::new_v4().to_string(),
            refresh_token: Some(uuid::Uuid::new_v4().to_string()),
            user,
        };
        store.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> BackendResult<()> {
        self.enter("sign_out").await?;
        self.lock().session = None;
        Ok(())
    }

    async fn is_admin(&self, user_id: &str) -> BackendResult<bool> {
        self.enter("is_admin").await?;
        Ok(self.lock().admins.contains(user_id))
    }

    async fn user_strategies(&self, owner_id: &str) -> BackendResult<Vec<Strategy>> {
        self.enter("user_strategies").await?;
        let mut strategies: Vec<Strategy> = self
            .lock()
            .strategies
            .iter()
            .filter(|s| s.owner_id == owner_id)
            .cloned()
            .collect();
        newest_first(&mut strategies, |s| s.created_at);
        Ok(strategies)
    }

    async fn strategy(&self, id: &str) -> BackendResult<Option<Strategy>> {
        self.enter("strategy").await?;
        Ok(self.lock().strategies.iter().find(|s| s.id == id).cloned())
    }

    async fn create_strategy(&self, strategy: NewStrategy) -> BackendResult<Strategy> {
        self.enter("create_strategy").await?;
        let mut store = self.lock();
        let now = Utc::now();
        let created = Strategy {
            id: store.next_id(),
            owner_id: strategy.owner_id,
            title: strategy.title,
            description: strategy.description,
            created_at: now,
            updated_at: now,
        };
        store.strategies.push(created.clone());
        Ok(created)
    }

    async fn update_strategy(&self, id: &str, update: StrategyUpdate) -> BackendResult<Strategy> {
        self.enter("update_strategy").await?;
        let mut store = self.lock();
        let strategy = store
            .strategies
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| BackendError::NotFound("strategy".to_string()))?;
        strategy.title = update.title;
        strategy.description = update.description;
        strategy.updated_at = Utc::now();
        Ok(strategy.clone())
    }

    async fn delete_strategy(&self, id: &str) -> BackendResult<()> {
        self.enter("delete_strategy").await?;
        let mut store = self.lock();
        store.strategies.retain(|s| s.id != id);
        store.assets.retain(|a| a.strategy_id != id);

        let removed: Vec<String> = store
            .attachments
            .iter()
            .filter(|a| a.strategy_id == id)
            .map(|a| a.file_path.clone())
            .collect();
        store.attachments.retain(|a| a.strategy_id != id);
        for path in removed {
            store.files.remove(&path);
        }
        Ok(())
    }

    async fn assets_by_strategy(&self, strategy_id: &str) -> BackendResult<Vec<Asset>> {
        self.enter("assets_by_strategy").await?;
        let store = self.lock();
        let mut assets: Vec<Asset> = store
            .assets
            .iter()
            .filter(|a| a.strategy_id == strategy_id)
            .map(|a| store.hydrate(a))
            .collect();
        newest_first(&mut assets, |a| a.created_at);
        Ok(assets)
    }

    async fn user_assets(&self, owner_id: &str) -> BackendResult<Vec<Asset>> {
        self.enter("user_assets").await?;
        let store = self.lock();
        let mut assets: Vec<Asset> = store
            .assets
            .iter()
            .filter(|a| store.owner_of(&a.strategy_id) == Some(owner_id))
            .map(|a| store.hydrate(a))
            .collect();
        newest_first(&mut assets, |a| a.created_at);
        Ok(assets)
    }

    async fn asset(&self, id: &str) -> BackendResult<Option<Asset>> {
        self.enter("asset").await?;
        let store = self.lock();
        Ok(store.assets.iter().find(|a| a.id == id).map(|a| store.hydrate(a)))
    }

    async fn create_asset(&self, asset: NewAsset) -> BackendResult<Asset> {
        self.enter("create_asset").await?;
        let mut store = self.lock();
        if store.owner_of(&asset.strategy_id).is_none() {
            return Err(BackendError::Rejected(
                "Asset must belong to an existing strategy".to_string(),
            ));
        }
        let created = Asset {
            id: store.next_id(),
            strategy_id: asset.strategy_id,
            ticker: asset.ticker,
            name: asset.name,
            exchange: Some(asset.exchange),
            quantity: asset.quantity,
            target_id: Some(asset.target_id),
            action_id: asset.action_id,
            target: None,
            action: None,
            strategy: None,
            created_at: Utc::now(),
        };
        store.assets.push(created.clone());
        Ok(store.hydrate(&created))
    }

    async fn update_asset(&self, id: &str, update: AssetUpdate) -> BackendResult<Asset> {
        self.enter("update_asset").await?;
        let mut store = self.lock();
        let asset = store
            .assets
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| BackendError::NotFound("asset".to_string()))?;
        asset.ticker = update.ticker;
        asset.name = update.name;
        asset.exchange = Some(update.exchange);
        asset.quantity = update.quantity;
        asset.target_id = Some(update.target_id);
        asset.action_id = update.action_id;
        let updated = asset.clone();
        Ok(store.hydrate(&updated))
    }

    async fn delete_asset(&self, id: &str) -> BackendResult<()> {
        self.enter("delete_asset").await?;
        self.lock().assets.retain(|a| a.id != id);
        Ok(())
    }

    async fn lookup(&self, table: LookupTable) -> BackendResult<Vec<LookupRecord>> {
        self.enter(table.table_name()).await?;
        let mut records = self.lock().lookups.get(&table).cloned().unwrap_or_default();
        records.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(records)
    }

    async fn attachments(&self, strategy_id: &str) -> BackendResult<Vec<Attachment>> {
        self.enter("attachments").await?;
        Ok(self
            .lock()
            .attachments
            .iter()
            .filter(|a| a.strategy_id == strategy_id)
            .cloned()
            .collect())
    }

    async fn upload_attachment(&self, strategy_id: &str, file: &SelectedFile) -> BackendResult<String> {
        self.enter("upload_attachment").await?;
        let path = attachment_object_path(strategy_id, &file.name);
        self.lock().files.insert(path.clone(), file.bytes.clone());
        Ok(path)
    }

    async fn create_attachment(&self, attachment: NewAttachment) -> BackendResult<Attachment> {
        self.enter("create_attachment").await?;
        let mut store = self.lock();
        let created = Attachment {
            id: store.next_id(),
            strategy_id: attachment.strategy_id,
            file_name: attachment.file_name,
            file_path: attachment.file_path,
            mime_type: attachment.mime_type,
            file_size: attachment.file_size,
            created_at: Some(Utc::now()),
        };
        store.attachments.push(created.clone());
        Ok(created)
    }

    async fn attachment_signed_url(&self, path: &str) -> BackendResult<String> {
        self.enter("attachment_signed_url").await?;
        if !self.lock().files.contains_key(path) {
            return Err(BackendError::NotFound("object".to_string()));
        }
        Ok(format!("memory://attachments/{}?token={}", path, uuid::Uuid::new_v4()))
    }

    async fn remove_attachment_file(&self, path: &str) -> BackendResult<()> {
        self.enter("remove_attachment_file").await?;
        self.lock().files.remove(path);
        Ok(())
    }

    async fn delete_attachment(&self, id: &str) -> BackendResult<()> {
        self.enter("delete_attachment").await?;
        self.lock().attachments.retain(|a| a.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_accounts_sign_in() {
        let backend = MemoryBackend::seeded();
        for email in DEMO_ACCOUNTS {
            let session = backend.sign_in(email, DEMO_PASSWORD).await.unwrap();
            assert_eq!(session.user.email, email);
        }
        let err = backend.sign_in("alice@example.com", "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_rejected() {
        let backend = MemoryBackend::seeded();
        let err = backend
            .sign_up("bob@example.com", "longenough")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "User already registered");
        assert!(backend.sign_up("dave@example.com", "longenough").await.is_ok());
    }

    #[tokio::test]
    async fn test_assets_carry_joins() {
        let backend = MemoryBackend::seeded();
        let alice = backend.user_id("alice@example.com").unwrap();
        let assets = backend.user_assets(&alice).await.unwrap();
        assert_eq!(assets.len(), 2);
        for asset in &assets {
            assert_eq!(asset.target.as_ref().unwrap().name, "Dividend");
            assert_eq!(asset.action.as_ref().unwrap().name, "Hold");
            assert_eq!(asset.strategy.as_ref().unwrap().owner_id, alice);
        }

        let bob = backend.user_id("bob@example.com").unwrap();
        assert!(backend.user_assets(&bob).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleting_strategy_cascades() {
        let backend = MemoryBackend::seeded();
        let alice = backend.user_id("alice@example.com").unwrap();
        let strategy = backend.user_strategies(&alice).await.unwrap().remove(0);

        let file = SelectedFile {
            name: "plan.pdf".into(),
            mime_type: Some("application/pdf".into()),
            bytes: vec![1, 2, 3],
        };
        let path = backend.upload_attachment(&strategy.id, &file).await.unwrap();
        backend
            .create_attachment(NewAttachment {
                strategy_id: strategy.id.clone(),
                file_name: file.name.clone(),
                file_path: path.clone(),
                mime_type: file.mime_type.clone(),
                file_size: file.size(),
            })
            .await
            .unwrap();

        backend.delete_strategy(&strategy.id).await.unwrap();
        assert!(backend.assets_by_strategy(&strategy.id).await.unwrap().is_empty());
        assert!(backend.attachments(&strategy.id).await.unwrap().is_empty());
        assert!(!backend.has_file(&path));
    }

    #[tokio::test]
    async fn test_injected_failure() {
        let backend = MemoryBackend::seeded();
        backend.fail_operation("targets", "lookup offline");
        let err = backend.lookup(LookupTable::Targets).await.unwrap_err();
        assert_eq!(err.to_string(), "lookup offline");
        assert!(backend.lookup(LookupTable::Actions).await.is_ok());

        backend.clear_failures();
        assert_eq!(backend.lookup(LookupTable::Targets).await.unwrap().len(), 3);
    }
}
