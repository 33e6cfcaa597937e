//! Synthetic actor registry.
//!
//! Actors are ordinary identities in the host's identity store, tagged with
//! [`ATTR_SYNTHETIC`] and a JSON persona under [`ATTR_PERSONA`], and grouped
//! in a dedicated membership pool.

use chrono::Utc;
use marionette_core::config::IdentityConfig;
use marionette_core::{
    Actor, ActorId, Archetype, EngineError, IdentityStore, PersonaRecord, PoolOptions,
    RandomSource, ATTR_PERSONA, ATTR_SYNTHETIC,
};
use std::sync::Arc;

const CREDENTIAL_LEN: usize = 16;

pub struct PersonaDirectory {
    identities: Arc<dyn IdentityStore>,
    rng: Arc<dyn RandomSource>,
    config: IdentityConfig,
}

impl PersonaDirectory {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        rng: Arc<dyn RandomSource>,
        config: IdentityConfig,
    ) -> Self {
        Self {
            identities,
            rng,
            config,
        }
    }

    /// Create a new identity, tag it with a random archetype and enroll it in the pool.
    ///
    /// If the identity store rejects the identity nothing else is written.
    /// Failures after creation are not compensated: the identity stays, possibly
    /// without its tags or pool membership.
    pub async fn spawn_actor(&self) -> Result<Actor, EngineError> {
        let username = format!(
            "{}{}",
            self.config.username_prefix,
            self.rng.number(100_000, 1_000_000)
        );
        let email = format!("{}@{}", username, self.config.email_domain);
        let archetype = Archetype::ALL[self.rng.index(Archetype::ALL.len())];

        let id = self
            .identities
            .create_identity(&username, &generate_credential(), &email)
            .await
            .map_err(|e| EngineError::identity(&username, e))?;

        let record = PersonaRecord {
            archetype,
            assigned_at: Utc::now(),
        };
        let encoded = record
            .encode()
            .map_err(|e| EngineError::store("encode_persona", e.into()))?;

        self.identities
            .set_attribute(id, ATTR_SYNTHETIC, "true")
            .await
            .map_err(|e| EngineError::store("set_attribute", e))?;
        self.identities
            .set_attribute(id, ATTR_PERSONA, &encoded)
            .await
            .map_err(|e| EngineError::store("set_attribute", e))?;

        self.ensure_pool().await?;
        self.identities
            .join_pool(&self.config.pool_name, id)
            .await
            .map_err(|e| EngineError::store("join_pool", e))?;

        tracing::info!(
            actor_id = id,
            %username,
            archetype = %archetype,
            "Spawned synthetic actor"
        );

        Ok(Actor {
            id,
            username,
            persona: Some(archetype),
            created_at: record.assigned_at,
        })
    }

    async fn ensure_pool(&self) -> Result<(), EngineError> {
        let name = &self.config.pool_name;
        let exists = self
            .identities
            .pool_exists(name)
            .await
            .map_err(|e| EngineError::store("pool_exists", e))?;
        if exists {
            return Ok(());
        }

        let opts = PoolOptions {
            description: self.config.pool_description.clone(),
            hidden: self.config.pool_hidden,
        };
        if let Err(e) = self.identities.create_pool(name, &opts).await {
            // A concurrent spawn may have created it between the check and here.
            let exists = self
                .identities
                .pool_exists(name)
                .await
                .map_err(|e| EngineError::store("pool_exists", e))?;
            if !exists {
                return Err(EngineError::store("create_pool", e));
            }
            tracing::debug!(pool = %name, "Actor pool appeared concurrently");
            return Ok(());
        }
        tracing::info!(pool = %name, "Created actor pool");
        Ok(())
    }

    /// Load an actor by id. `None` when the identity does not exist.
    ///
    /// A missing or unparseable persona attribute yields an actor without a persona.
    pub async fn fetch_actor(&self, id: ActorId) -> Result<Option<Actor>, EngineError> {
        let Some(identity) = self
            .identities
            .get_identity(id)
            .await
            .map_err(|e| EngineError::store("get_identity", e))?
        else {
            return Ok(None);
        };

        let persona = identity
            .attributes
            .get(ATTR_PERSONA)
            .and_then(|raw| PersonaRecord::decode(raw))
            .map(|record| record.archetype);
        if persona.is_none() {
            tracing::warn!(actor_id = id, "Actor has no usable persona attribute");
        }

        Ok(Some(Actor {
            id: identity.id,
            username: identity.username,
            persona,
            created_at: identity.created_at,
        }))
    }

    /// Uniform pick from the pool. `None` when the pool is empty.
    pub async fn pick_random_actor(&self) -> Result<Option<Actor>, EngineError> {
        let members = self
            .identities
            .list_pool_members(&self.config.pool_name)
            .await
            .map_err(|e| EngineError::store("list_pool_members", e))?;
        if members.is_empty() {
            return Ok(None);
        }
        let id = members[self.rng.index(members.len())];
        self.fetch_actor(id).await
    }

    pub async fn pool_size(&self) -> Result<usize, EngineError> {
        self.identities
            .pool_member_count(&self.config.pool_name)
            .await
            .map_err(|e| EngineError::store("pool_member_count", e))
    }
}

/// Random alphanumeric credential. Actors never log in interactively.
fn generate_credential() -> String {
    uuid::Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(CREDENTIAL_LEN)
        .collect()
}
