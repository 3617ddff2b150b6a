/*!
 * Authorization Facade
 * Entry point the rest of the system calls to authorize a request
 *
 * Read-only: candidate policies are fetched, compiled and evaluated without
 * touching stored state. Requests may run concurrently with no coordination.
 */

use super::audit::{AuditEvent, AuditLogger, AuditStats};
use super::cache::{CacheKey, CacheStats, DecisionCache};
use super::types::AuthorizationOutcome;
use crate::config::EngineConfig;
use crate::core::{AccessType, AuthzError, AuthzResult, Decision, Resource, ResourceId, SubjectId};
use crate::policy::{DecisionEngine, PolicyCompiler, RequestContext};
use crate::store::{CurrentSubjectProvider, Repositories};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

#[derive(Clone)]
pub struct Authorizer {
    repositories: Repositories,
    config: EngineConfig,
    current: Option<Arc<dyn CurrentSubjectProvider>>,
    cache: Option<Arc<DecisionCache>>,
    audit: Option<Arc<AuditLogger>>,
}

impl Authorizer {
    pub fn new(repositories: Repositories) -> Self {
        Self::with_config(repositories, EngineConfig::default())
    }

    pub fn with_config(repositories: Repositories, config: EngineConfig) -> Self {
        debug!(
            scope = ?config.candidate_scope,
            cache_capacity = config.cache_capacity,
            audit = config.audit,
            "Initializing authorizer"
        );
        let cache = config
            .cache_enabled()
            .then(|| Arc::new(DecisionCache::new(config.cache_capacity, config.cache_ttl)));
        let audit = config.audit.then(|| Arc::new(AuditLogger::new()));

        Self {
            repositories,
            config,
            current: None,
            cache,
            audit,
        }
    }

    /// Attach the authentication layer's subject provider
    pub fn with_current_subject(mut self, provider: Arc<dyn CurrentSubjectProvider>) -> Self {
        self.current = Some(provider);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decide a request
    ///
    /// On `Denied` the outcome carries no payload.
    #[instrument(skip_all, fields(subject = %subject, access = %access_type))]
    pub fn authorize(
        &self,
        subject: &SubjectId,
        resource: Option<Resource>,
        access_type: AccessType,
        context: &RequestContext,
    ) -> AuthzResult<AuthorizationOutcome> {
        if !self.repositories.subjects.exists(subject)? {
            warn!("Unknown subject");
            return Err(AuthzError::SubjectNotFound(subject.to_string()));
        }

        let resource_id = resource.as_ref().map(|r| r.id.clone());
        let revision = self.repositories.policies.revision();
        let key = self.cache.as_ref().and_then(|_| {
            CacheKey::new(subject, access_type, resource.as_ref(), context, revision)
        });

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(outcome) = cache.get(key) {
                debug!(decision = %outcome.decision, "Cache hit");
                self.record(&outcome, resource_id);
                return Ok(outcome);
            }
        }

        let engine = self.engine_for(access_type, resource.as_ref())?;
        let evaluation = engine.decide(access_type, resource, context);

        let resource = match evaluation.decision {
            Decision::Permitted => evaluation.resource,
            Decision::Denied => None,
        };
        let outcome = AuthorizationOutcome {
            subject: subject.clone(),
            access_type,
            decision: evaluation.decision,
            resource,
            fired: evaluation.fired,
            reason: evaluation.reason,
            cached: false,
        };
        info!(decision = %outcome.decision, fired = outcome.fired.len(), reason = %outcome.reason, "Authorization decided");

        if let (Some(cache), Some(key)) = (&self.cache, key) {
            cache.put(key, outcome.clone());
        }
        self.record(&outcome, resource_id);

        Ok(outcome)
    }

    /// Like `authorize`, with the access type given by name
    pub fn authorize_named(
        &self,
        subject: &SubjectId,
        resource: Option<Resource>,
        access_type: &str,
        context: &RequestContext,
    ) -> AuthzResult<AuthorizationOutcome> {
        let access_type = access_type.parse::<AccessType>()?;
        self.authorize(subject, resource, access_type, context)
    }

    /// Decide a request on behalf of the authenticated caller
    pub fn authorize_current(
        &self,
        resource: Option<Resource>,
        access_type: AccessType,
        context: &RequestContext,
    ) -> AuthzResult<AuthorizationOutcome> {
        let subject = self
            .current
            .as_ref()
            .and_then(|provider| provider.current_subject())
            .ok_or_else(|| AuthzError::SubjectNotFound("<unauthenticated>".into()))?;
        self.authorize(&subject, resource, access_type, context)
    }

    /// Authorize and surface a denial as `AccessDenied`
    pub fn enforce(
        &self,
        subject: &SubjectId,
        resource: Option<Resource>,
        access_type: AccessType,
        context: &RequestContext,
    ) -> AuthzResult<Option<Resource>> {
        let outcome = self.authorize(subject, resource, access_type, context)?;
        match outcome.decision {
            Decision::Permitted => Ok(outcome.resource),
            Decision::Denied => Err(AuthzError::AccessDenied(outcome.reason)),
        }
    }

    /// Compile the candidate policy set for a request
    ///
    /// Fails as a whole if any candidate references an unrecognized variant
    /// or a missing object.
    pub fn engine_for(
        &self,
        access_type: AccessType,
        resource: Option<&Resource>,
    ) -> AuthzResult<DecisionEngine> {
        let candidates = self.repositories.policies.candidates(
            self.config.candidate_scope,
            access_type,
            resource,
        )?;
        let compiler = PolicyCompiler::new(
            self.repositories.conditions.as_ref(),
            self.repositories.effects.as_ref(),
            self.config.max_condition_depth,
        );
        DecisionEngine::compile(&candidates, &compiler).map_err(|err| {
            warn!(error = %err, "Candidate policy set failed to compile");
            AuthzError::from(err)
        })
    }

    fn record(&self, outcome: &AuthorizationOutcome, resource: Option<ResourceId>) {
        if let Some(audit) = &self.audit {
            audit.log(AuditEvent::new(outcome, resource));
        }
    }

    pub fn audit(&self) -> Option<&AuditLogger> {
        self.audit.as_deref()
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    pub fn audit_stats(&self) -> Option<AuditStats> {
        self.audit.as_ref().map(|audit| audit.stats())
    }

    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }
}
