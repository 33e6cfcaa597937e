//! In-process host platform.
//!
//! Implements every collaborator trait over plain maps so the engine can run
//! without a real forum behind it. Used by the CLI and by the test suites.
//! Any operation can be made to fail once with [`InMemoryHost::fail_next`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use marionette_core::{
    ActorId, Category, CategoryId, CategoryResolver, ContentStore, IdentityRecord,
    IdentityStore, NewReply, NewThread, PoolOptions, PostId, PostRecord, ReplyDescriptor,
    ThreadDescriptor, ThreadId, ThreadRecord,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct PoolState {
    pub description: String,
    pub hidden: bool,
    pub members: Vec<ActorId>,
}

#[derive(Debug, Clone)]
struct CategoryState {
    category: Category,
    postable: bool,
}

#[derive(Default)]
struct HostState {
    next_id: u64,
    identities: BTreeMap<ActorId, IdentityRecord>,
    usernames: HashSet<String>,
    pools: HashMap<String, PoolState>,
    pools_created: usize,
    attribute_writes: usize,
    categories: Vec<CategoryState>,
    threads: BTreeMap<ThreadId, ThreadRecord>,
    posts: BTreeMap<PostId, PostRecord>,
    tags: HashMap<ThreadId, Vec<String>>,
    failures: HashSet<&'static str>,
}

impl HostState {
    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn check(&mut self, operation: &'static str) -> anyhow::Result<()> {
        if self.failures.remove(operation) {
            anyhow::bail!("injected failure in {}", operation);
        }
        Ok(())
    }

    fn insert_thread(
        &mut self,
        author_id: ActorId,
        category_id: CategoryId,
        title: &str,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> ThreadDescriptor {
        let thread_id = self.allocate_id();
        let main_post_id = self.allocate_id();
        self.threads.insert(
            thread_id,
            ThreadRecord {
                id: thread_id,
                title: title.to_string(),
                category_id,
                author_id,
                main_post_id,
                created_at,
                deleted: false,
            },
        );
        self.posts.insert(
            main_post_id,
            PostRecord {
                id: main_post_id,
                thread_id,
                author_id,
                body: body.to_string(),
                created_at,
            },
        );
        ThreadDescriptor {
            thread_id,
            main_post_id,
            category_id,
            actor_id: author_id,
            title: title.to_string(),
        }
    }
}

#[derive(Default)]
pub struct InMemoryHost {
    state: Mutex<HostState>,
}

impl InMemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// A host with one open category, enough for every action to succeed.
    pub fn with_default_category() -> Self {
        let host = Self::new();
        host.add_category("General Discussion", true);
        host
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make the next call to `operation` (trait method name) fail.
    pub fn fail_next(&self, operation: &'static str) {
        self.lock().failures.insert(operation);
    }

    pub fn add_category(&self, name: &str, postable: bool) -> CategoryId {
        let mut state = self.lock();
        let id = state.allocate_id();
        state.categories.push(CategoryState {
            category: Category {
                id,
                name: name.to_string(),
            },
            postable,
        });
        id
    }

    /// Insert a thread with an explicit creation time.
    pub fn seed_thread(
        &self,
        author_id: ActorId,
        category_id: CategoryId,
        title: &str,
        body: &str,
        created_at: DateTime<Utc>,
    ) -> ThreadDescriptor {
        self.lock()
            .insert_thread(author_id, category_id, title, body, created_at)
    }

    pub fn delete_thread(&self, id: ThreadId) {
        if let Some(thread) = self.lock().threads.get_mut(&id) {
            thread.deleted = true;
        }
    }

    pub fn remove_post(&self, id: PostId) {
        self.lock().posts.remove(&id);
    }

    pub fn identity(&self, id: ActorId) -> Option<IdentityRecord> {
        self.lock().identities.get(&id).cloned()
    }

    pub fn pool(&self, name: &str) -> Option<PoolState> {
        self.lock().pools.get(name).cloned()
    }

    pub fn pools_created(&self) -> usize {
        self.lock().pools_created
    }

    pub fn attribute_writes(&self) -> usize {
        self.lock().attribute_writes
    }

    pub fn identity_count(&self) -> usize {
        self.lock().identities.len()
    }

    pub fn threads(&self) -> Vec<ThreadRecord> {
        self.lock().threads.values().cloned().collect()
    }

    /// Posts in a thread other than its main post, oldest first.
    pub fn replies(&self, thread_id: ThreadId) -> Vec<PostRecord> {
        let state = self.lock();
        let main = state.threads.get(&thread_id).map(|t| t.main_post_id);
        state
            .posts
            .values()
            .filter(|p| p.thread_id == thread_id && Some(p.id) != main)
            .cloned()
            .collect()
    }

    pub fn post_body(&self, id: PostId) -> Option<String> {
        self.lock().posts.get(&id).map(|p| p.body.clone())
    }

    pub fn thread_tags(&self, id: ThreadId) -> Vec<String> {
        self.lock().tags.get(&id).cloned().unwrap_or_default()
    }
}

// ============================================================================
// Collaborator impls
// ============================================================================

#[async_trait]
impl IdentityStore for InMemoryHost {
    async fn create_identity(
        &self,
        username: &str,
        _password: &str,
        email: &str,
    ) -> anyhow::Result<ActorId> {
        let mut state = self.lock();
        state.check("create_identity")?;
        if username.is_empty() || !email.contains('@') {
            anyhow::bail!("invalid username or email");
        }
        if !state.usernames.insert(username.to_string()) {
            anyhow::bail!("username '{}' is taken", username);
        }
        let id = state.allocate_id();
        state.identities.insert(
            id,
            IdentityRecord {
                id,
                username: username.to_string(),
                email: email.to_string(),
                created_at: Utc::now(),
                attributes: HashMap::new(),
            },
        );
        Ok(id)
    }

    async fn get_identity(&self, id: ActorId) -> anyhow::Result<Option<IdentityRecord>> {
        let mut state = self.lock();
        state.check("get_identity")?;
        Ok(state.identities.get(&id).cloned())
    }

    async fn set_attribute(&self, id: ActorId, key: &str, value: &str) -> anyhow::Result<()> {
        let mut state = self.lock();
        state.check("set_attribute")?;
        let identity = state
            .identities
            .get_mut(&id)
            .ok_or_else(|| anyhow::anyhow!("no identity {}", id))?;
        identity.attributes.insert(key.to_string(), value.to_string());
        state.attribute_writes += 1;
        Ok(())
    }

    async fn pool_exists(&self, name: &str) -> anyhow::Result<bool> {
        let mut state = self.lock();
        state.check("pool_exists")?;
        Ok(state.pools.contains_key(name))
    }

    async fn create_pool(&self, name: &str, opts: &PoolOptions) -> anyhow::Result<()> {
        let mut state = self.lock();
        state.check("create_pool")?;
        if state.pools.contains_key(name) {
            anyhow::bail!("pool '{}' already exists", name);
        }
        state.pools.insert(
            name.to_string(),
            PoolState {
                description: opts.description.clone(),
                hidden: opts.hidden,
                members: Vec::new(),
            },
        );
        state.pools_created += 1;
        Ok(())
    }

    async fn join_pool(&self, name: &str, id: ActorId) -> anyhow::Result<()> {
        let mut state = self.lock();
        state.check("join_pool")?;
        let pool = state
            .pools
            .get_mut(name)
            .ok_or_else(|| anyhow::anyhow!("no pool '{}'", name))?;
        if !pool.members.contains(&id) {
            pool.members.push(id);
        }
        Ok(())
    }

    async fn list_pool_members(&self, name: &str) -> anyhow::Result<Vec<ActorId>> {
        let mut state = self.lock();
        state.check("list_pool_members")?;
        Ok(state
            .pools
            .get(name)
            .map(|p| p.members.clone())
            .unwrap_or_default())
    }

    async fn pool_member_count(&self, name: &str) -> anyhow::Result<usize> {
        let mut state = self.lock();
        state.check("pool_member_count")?;
        Ok(state.pools.get(name).map_or(0, |p| p.members.len()))
    }
}

#[async_trait]
impl ContentStore for InMemoryHost {
    async fn create_thread(&self, thread: &NewThread) -> anyhow::Result<ThreadDescriptor> {
        let mut state = self.lock();
        state.check("create_thread")?;
        if !state
            .categories
            .iter()
            .any(|c| c.category.id == thread.category_id)
        {
            anyhow::bail!("no category {}", thread.category_id);
        }
        let descriptor = state.insert_thread(
            thread.actor_id,
            thread.category_id,
            &thread.title,
            &thread.body,
            Utc::now(),
        );
        state.tags.insert(descriptor.thread_id, thread.tags.clone());
        Ok(descriptor)
    }

    async fn create_reply(&self, reply: &NewReply) -> anyhow::Result<ReplyDescriptor> {
        let mut state = self.lock();
        state.check("create_reply")?;
        match state.threads.get(&reply.thread_id) {
            Some(t) if !t.deleted => {}
            _ => anyhow::bail!("thread {} is not open for replies", reply.thread_id),
        }
        let post_id = state.allocate_id();
        state.posts.insert(
            post_id,
            PostRecord {
                id: post_id,
                thread_id: reply.thread_id,
                author_id: reply.actor_id,
                body: reply.body.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(ReplyDescriptor {
            post_id,
            thread_id: reply.thread_id,
            actor_id: reply.actor_id,
        })
    }

    async fn get_thread(&self, id: ThreadId) -> anyhow::Result<Option<ThreadRecord>> {
        let mut state = self.lock();
        state.check("get_thread")?;
        Ok(state.threads.get(&id).cloned())
    }

    async fn get_post(&self, id: PostId) -> anyhow::Result<Option<PostRecord>> {
        let mut state = self.lock();
        state.check("get_post")?;
        Ok(state.posts.get(&id).cloned())
    }

    async fn list_threads_created_after(
        &self,
        since: DateTime<Utc>,
    ) -> anyhow::Result<Vec<ThreadId>> {
        let mut state = self.lock();
        state.check("list_threads_created_after")?;
        Ok(state
            .threads
            .values()
            .filter(|t| t.created_at >= since)
            .map(|t| t.id)
            .collect())
    }

    async fn get_threads_data(&self, ids: &[ThreadId]) -> anyhow::Result<Vec<ThreadRecord>> {
        let mut state = self.lock();
        state.check("get_threads_data")?;
        Ok(ids
            .iter()
            .filter_map(|id| state.threads.get(id).cloned())
            .collect())
    }
}

#[async_trait]
impl CategoryResolver for InMemoryHost {
    async fn list_categories(&self, _actor: ActorId) -> anyhow::Result<Vec<Category>> {
        let mut state = self.lock();
        state.check("list_categories")?;
        Ok(state.categories.iter().map(|c| c.category.clone()).collect())
    }

    async fn can_create_thread(
        &self,
        category: CategoryId,
        _actor: ActorId,
    ) -> anyhow::Result<bool> {
        let mut state = self.lock();
        state.check("can_create_thread")?;
        Ok(state
            .categories
            .iter()
            .any(|c| c.category.id == category && c.postable))
    }
}
