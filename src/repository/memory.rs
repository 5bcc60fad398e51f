//! In-process repositories backed by `Mutex`-guarded collections.
//!
//! They follow the same contracts as the MongoDB implementations, including
//! insert-only `role` on upsert, and are what the service and router tests run
//! against.

use crate::model::session::Session;
use crate::model::user::{ProfileUpdate, User, UserIdentity};
use crate::repository::product_repo::{ProductRepository, UpdateOutcome};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};
use crate::repository::session_repo::SessionRepository;
use crate::repository::user_repo::UserRepository;
use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> RepositoryResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| RepositoryError::database("in-memory store poisoned"))
}

fn matches_id(doc: &Document, id: &str) -> bool {
    let id = id.trim();
    match ObjectId::parse_str(id) {
        Ok(oid) => doc.get_object_id("_id").map(|found| found == oid).unwrap_or(false),
        Err(_) => matches!(doc.get("id"), Some(Bson::String(s)) if s == id),
    }
}

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a stored user, e.g. one whose role was changed out of band.
    pub fn insert_user(&self, mut user: User) -> RepositoryResult<User> {
        if user.id.is_none() {
            user.id = Some(ObjectId::new());
        }
        lock(&self.users)?.push(user.clone());
        Ok(user)
    }

    pub fn len(&self) -> usize {
        self.users.lock().map(|u| u.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn upsert_identity(&self, identity: &UserIdentity, role_on_insert: &str) -> RepositoryResult<User> {
        let now = bson::DateTime::now();
        let mut users = lock(&self.users)?;
        let set = identity.to_set_document(now);
        let existing = users.iter_mut().find(|u| u.google_id == identity.google_id);
        let user = match existing {
            Some(user) => {
                let mut stored = bson::to_document(&*user)?;
                stored.extend(set);
                *user = bson::from_document(stored)?;
                user.clone()
            }
            None => {
                let mut stored = set;
                stored.insert("_id", ObjectId::new());
                stored.insert("role", role_on_insert);
                stored.insert("favorites", Bson::Array(Vec::new()));
                stored.insert("created_at", now);
                let user: User = bson::from_document(stored)?;
                users.push(user.clone());
                user
            }
        };
        Ok(user)
    }

    async fn find_by_id(&self, id: &str) -> RepositoryResult<Option<User>> {
        let users = lock(&self.users)?;
        Ok(users.iter().find(|u| u.id_hex().as_deref() == Some(id.trim())).cloned())
    }

    async fn update_profile(&self, id: &str, update: &ProfileUpdate) -> RepositoryResult<Option<User>> {
        let mut users = lock(&self.users)?;
        let Some(user) = users.iter_mut().find(|u| u.id_hex().as_deref() == Some(id.trim())) else {
            return Ok(None);
        };
        if let Some(ref name) = update.name {
            user.name = Some(name.clone());
        }
        if let Some(ref picture) = update.picture {
            user.picture = Some(picture.clone());
        }
        user.updated_at = Some(bson::DateTime::now());
        Ok(Some(user.clone()))
    }

    async fn toggle_favorite(&self, id: &str, product_id: &str) -> RepositoryResult<bool> {
        let mut users = lock(&self.users)?;
        let user = users
            .iter_mut()
            .find(|u| u.id_hex().as_deref() == Some(id.trim()))
            .ok_or_else(|| RepositoryError::not_found(format!("User not found for ID: {}", id)))?;
        if let Some(pos) = user.favorites.iter().position(|f| f == product_id) {
            user.favorites.remove(pos);
            Ok(false)
        } else {
            user.favorites.push(product_id.to_string());
            Ok(true)
        }
    }
}

#[derive(Default)]
pub struct InMemorySessionRepository {
    sessions: Mutex<HashMap<String, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a session row still exists, expired or not.
    pub fn contains(&self, id: &str) -> bool {
        self.sessions.lock().map(|s| s.contains_key(id)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn insert(&self, session: &Session) -> RepositoryResult<()> {
        let mut sessions = lock(&self.sessions)?;
        if sessions.contains_key(&session.id) {
            return Err(RepositoryError::AlreadyExists(format!("Session {} exists", session.id)));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn find(&self, id: &str) -> RepositoryResult<Option<Session>> {
        Ok(lock(&self.sessions)?.get(id).cloned())
    }

    async fn delete(&self, id: &str) -> RepositoryResult<u64> {
        Ok(lock(&self.sessions)?.remove(id).map(|_| 1).unwrap_or(0))
    }
}

/// Products kept newest first, mirroring the `created_at` descending sort.
#[derive(Default)]
pub struct InMemoryProductRepository {
    products: Mutex<Vec<Document>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw document as-is, assigning an `_id` when it has neither `_id` nor `id`.
    pub fn seed(&self, mut product: Document) -> RepositoryResult<String> {
        if !product.contains_key("_id") && !product.contains_key("id") {
            product.insert("_id", ObjectId::new());
        }
        let id = match (product.get("_id"), product.get("id")) {
            (Some(Bson::ObjectId(oid)), _) => oid.to_hex(),
            (_, Some(Bson::String(s))) => s.clone(),
            (Some(other), _) => other.to_string(),
            _ => String::new(),
        };
        lock(&self.products)?.insert(0, product);
        Ok(id)
    }

    fn matching(&self, query: &str) -> RepositoryResult<Vec<Document>> {
        let needle = query.trim().to_lowercase();
        let products = lock(&self.products)?;
        if needle.is_empty() {
            return Ok(products.clone());
        }
        Ok(products
            .iter()
            .filter(|doc| searchable_text(doc).iter().any(|s| s.to_lowercase().contains(&needle)))
            .cloned()
            .collect())
    }
}

fn searchable_text(doc: &Document) -> Vec<String> {
    let mut out = Vec::new();
    for key in ["name", "description"] {
        if let Ok(s) = doc.get_str(key) {
            out.push(s.to_string());
        }
    }
    let ia_tags = doc.get_document("ia_tags").ok().and_then(|d| d.get("tags"));
    for tags in [doc.get("tags"), ia_tags].into_iter().flatten() {
        match tags {
            Bson::String(s) => out.push(s.clone()),
            Bson::Array(items) => out.extend(items.iter().filter_map(|b| b.as_str().map(str::to_string))),
            _ => {}
        }
    }
    out
}

fn page_of(items: Vec<Document>, page: u64, page_size: i64) -> Vec<Document> {
    let size = page_size.max(0) as usize;
    let skip = usize::try_from(page.max(1) - 1).unwrap_or(usize::MAX).saturating_mul(size);
    items.into_iter().skip(skip).take(size).collect()
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn list(&self, page: u64, page_size: i64) -> RepositoryResult<Vec<Document>> {
        Ok(page_of(lock(&self.products)?.clone(), page, page_size))
    }

    async fn list_limited(&self, limit: i64) -> RepositoryResult<Vec<Document>> {
        let products = lock(&self.products)?;
        if limit > 0 {
            Ok(products.iter().take(limit as usize).cloned().collect())
        } else {
            Ok(products.clone())
        }
    }

    async fn count(&self) -> RepositoryResult<u64> {
        Ok(lock(&self.products)?.len() as u64)
    }

    async fn search(&self, query: &str, page: u64, page_size: i64) -> RepositoryResult<Vec<Document>> {
        Ok(page_of(self.matching(query)?, page, page_size))
    }

    async fn count_search(&self, query: &str) -> RepositoryResult<u64> {
        Ok(self.matching(query)?.len() as u64)
    }

    async fn find(&self, id: &str) -> RepositoryResult<Option<Document>> {
        Ok(lock(&self.products)?.iter().find(|d| matches_id(d, id)).cloned())
    }

    async fn insert(&self, product: Document) -> RepositoryResult<String> {
        let mut product = product;
        product.remove("_id");
        product.remove("id");
        self.seed(product)
    }

    async fn update(&self, id: &str, set: Document) -> RepositoryResult<UpdateOutcome> {
        let mut products = lock(&self.products)?;
        let Some(doc) = products.iter_mut().find(|d| matches_id(d, id)) else {
            return Ok(UpdateOutcome { matched: 0, modified: 0 });
        };
        let mut modified = 0;
        for (key, value) in set {
            if doc.get(&key) != Some(&value) {
                doc.insert(key, value);
                modified = 1;
            }
        }
        Ok(UpdateOutcome { matched: 1, modified })
    }

    async fn delete(&self, id: &str) -> RepositoryResult<u64> {
        let mut products = lock(&self.products)?;
        let before = products.len();
        if let Some(pos) = products.iter().position(|d| matches_id(d, id)) {
            products.remove(pos);
        }
        Ok((before - products.len()) as u64)
    }
}
